//! Access Control Merger
//!
//! Reconciles an incoming access-control list with the live one.

use crate::import::options::AccessControlHandling;
use crate::tree::AccessControlList;

/// Compute the list to store, or `None` to leave the live list unchanged.
pub fn merge_policy(
    live: Option<&AccessControlList>,
    incoming: &AccessControlList,
    handling: AccessControlHandling,
) -> Option<AccessControlList> {
    match handling {
        AccessControlHandling::Ignore => None,
        AccessControlHandling::Overwrite => Some(incoming.clone()),
        AccessControlHandling::Merge => {
            let mut merged = base(live, incoming);
            let existing = merged.entries.len();
            for entry in &incoming.entries {
                if merged.contains(entry) {
                    continue;
                }
                let target = merged.entries[..existing]
                    .iter()
                    .position(|e| e.same_target(entry));
                match target {
                    Some(index) => merged.entries[index] = entry.clone(),
                    None => merged.entries.push(entry.clone()),
                }
            }
            Some(merged)
        }
        AccessControlHandling::MergePreserve => {
            let mut merged = base(live, incoming);
            for entry in &incoming.entries {
                if !merged.contains(entry) {
                    merged.entries.push(entry.clone());
                }
            }
            Some(merged)
        }
    }
}

fn base(live: Option<&AccessControlList>, incoming: &AccessControlList) -> AccessControlList {
    live.cloned()
        .unwrap_or_else(|| AccessControlList::new(incoming.kind))
}
