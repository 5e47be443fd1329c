//! Filter presentation: coverage checks.

use crate::cli::presentation::to_json;
use crate::error::PackageError;
use crate::import::ImportMode;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use serde::Serialize;

/// Filter answers for one path.
#[derive(Debug, Clone, Serialize)]
pub struct PathCheck {
    pub path: String,
    pub covered: bool,
    pub root: Option<String>,
    pub mode: Option<ImportMode>,
    /// Subtree is never traversed by an import.
    pub skipped: bool,
}

pub fn format_filter_check(checks: &[PathCheck], format: &str) -> Result<String, PackageError> {
    if format == "json" {
        return to_json(&checks);
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Path", "Covered", "Root", "Mode"]);
    for check in checks {
        let covered = if check.covered {
            "yes"
        } else if check.skipped {
            "no (skipped)"
        } else {
            "no"
        };
        table.add_row(vec![
            check.path.clone(),
            covered.to_string(),
            check.root.clone().unwrap_or_else(|| "-".to_string()),
            check
                .mode
                .map(|m| m.to_string())
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }
    Ok(table.to_string())
}
