//! Content kinds and their handler table

use crate::error::ImportError;
use crate::import::access_control::merge_policy;
use crate::import::engine::{Outcome, Session};
use crate::import::options::ImportMode;
use crate::tree::{
    AccessControlList, ContentDescriptor, LiveNode, NodeTypeDefinition, PolicyKind, Repository,
};
use tracing::debug;

/// Closed classification of a descriptor, resolved once per node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    File = 0,
    Folder = 1,
    Generic = 2,
    Policy = 3,
}

impl ContentKind {
    pub fn classify(
        descriptor: &ContentDescriptor,
        existing: Option<&LiveNode>,
        repo: &dyn Repository,
    ) -> ContentKind {
        if descriptor.policy.is_some()
            || PolicyKind::from_node_type(&descriptor.primary_type).is_some()
        {
            return ContentKind::Policy;
        }
        let flag = |name: &str, test: fn(&NodeTypeDefinition) -> bool| {
            repo.node_type(name).map(test).unwrap_or(false)
        };
        if flag(&descriptor.primary_type, |d| d.file) {
            ContentKind::File
        } else if flag(&descriptor.primary_type, |d| d.folder)
            || existing
                .map(|n| flag(&n.primary_type, |d| d.folder))
                .unwrap_or(false)
        {
            ContentKind::Folder
        } else {
            ContentKind::Generic
        }
    }
}

pub(super) type Handler = fn(
    &mut Session<'_>,
    &ContentDescriptor,
    Option<LiveNode>,
    ImportMode,
) -> Result<Outcome, ImportError>;

/// Indexed by `ContentKind as usize`.
pub(super) const HANDLERS: [Handler; 4] = [import_file, import_folder, import_generic, import_policy];

/// File content is atomic: merge modes leave an existing file alone.
fn import_file(
    session: &mut Session<'_>,
    descriptor: &ContentDescriptor,
    existing: Option<LiveNode>,
    mode: ImportMode,
) -> Result<Outcome, ImportError> {
    if existing.is_some() && mode.is_merge() {
        debug!(path = %descriptor.path, "Keeping existing file");
        return Ok(Outcome::skip());
    }
    session.import_content(descriptor, existing, mode, false)
}

fn import_folder(
    session: &mut Session<'_>,
    descriptor: &ContentDescriptor,
    existing: Option<LiveNode>,
    mode: ImportMode,
) -> Result<Outcome, ImportError> {
    let preserve = !session.options.overwrite_primary_types_of_folders;
    session.import_content(descriptor, existing, mode, preserve)
}

fn import_generic(
    session: &mut Session<'_>,
    descriptor: &ContentDescriptor,
    existing: Option<LiveNode>,
    mode: ImportMode,
) -> Result<Outcome, ImportError> {
    session.import_content(descriptor, existing, mode, false)
}

/// Policy nodes follow the access-control handling, not the import mode.
fn import_policy(
    session: &mut Session<'_>,
    descriptor: &ContentDescriptor,
    existing: Option<LiveNode>,
    _mode: ImportMode,
) -> Result<Outcome, ImportError> {
    let path = &descriptor.path;
    let kind = descriptor
        .policy
        .as_ref()
        .map(|p| p.kind)
        .or_else(|| PolicyKind::from_node_type(&descriptor.primary_type))
        .ok_or_else(|| ImportError::ConstraintViolation {
            path: path.to_string(),
            message: format!("{} is not a policy type", descriptor.primary_type),
        })?;
    let incoming = descriptor
        .policy
        .clone()
        .unwrap_or_else(|| AccessControlList::new(kind));
    let handling = session.options.handling_for(kind);
    let live = existing.as_ref().and_then(|n| n.policy.as_ref());

    match merge_policy(live, &incoming, handling) {
        Some(merged) if existing.is_none() || live != Some(&merged) => {
            session.ensure_parent(path, merged.kind.node_type())?;
            session.repo.write_policy(path, &merged)?;
            if existing.is_some() {
                session.updated(path);
            } else {
                session.added(path);
            }
        }
        _ => debug!(path = %path, %handling, "Access control unchanged"),
    }
    Ok(Outcome::skip())
}
