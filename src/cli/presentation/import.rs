//! Import presentation: per-path changes and the summary line.

use crate::cli::presentation::to_json;
use crate::error::PackageError;
use crate::import::ImportReport;
use owo_colors::OwoColorize;

pub fn format_import_report(report: &ImportReport, format: &str) -> Result<String, PackageError> {
    if format == "json" {
        return to_json(report);
    }
    let mut lines = Vec::new();
    for path in &report.added {
        lines.push(format!("{} {}", "A".green(), path));
    }
    for path in &report.updated {
        lines.push(format!("{} {}", "U".yellow(), path));
    }
    for path in &report.removed {
        lines.push(format!("{} {}", "D".red(), path));
    }
    for failure in &report.errors {
        lines.push(format!("{} {} ({})", "E".red().bold(), failure.path, failure.message));
    }
    for diagnostic in &report.diagnostics {
        lines.push(format!("  warning: {}", diagnostic.message));
    }
    lines.push(report.summary());
    Ok(lines.join("\n"))
}
