//! Package presentation: plans, install/uninstall results, registry listings.

use crate::cli::presentation::to_json;
use crate::dependency::{DependencyPlan, RegisteredPackage};
use crate::error::PackageError;
use crate::manager::{InstallResult, UninstallResult};
use crate::package::PackageId;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

pub fn format_plan(plan: &DependencyPlan, format: &str) -> Result<String, PackageError> {
    if format == "json" {
        return to_json(plan);
    }
    let mut s = String::from("Order:");
    for (i, id) in plan.order.iter().enumerate() {
        s.push_str(&format!("\n  {}. {}", i + 1, id));
    }
    if !plan.unresolved.is_empty() {
        s.push_str(&format!("\n\nUnresolved ({}):", plan.unresolved.len()));
        for missing in &plan.unresolved {
            s.push_str(&format!(
                "\n  - {} (required by {})",
                missing.dependency, missing.required_by
            ));
        }
    }
    if !plan.cycles.is_empty() {
        s.push_str(&format!("\n\nCycles broken ({}):", plan.cycles.len()));
        for cycle in &plan.cycles {
            let rendered: Vec<String> = cycle.iter().map(|id| id.to_string()).collect();
            s.push_str(&format!("\n  - {}", rendered.join(" -> ")));
        }
    }
    Ok(s)
}

pub fn format_install_result(result: &InstallResult, format: &str) -> Result<String, PackageError> {
    if format == "json" {
        return to_json(result);
    }
    let mut lines = Vec::new();
    for entry in &result.reports {
        let status = if entry.report.has_errors() {
            "failed".red().to_string()
        } else {
            "installed".green().to_string()
        };
        lines.push(format!("{} {}: {}", status, entry.package, entry.report.summary()));
        for failure in &entry.report.errors {
            lines.push(format!("  E {} ({})", failure.path, failure.message));
        }
    }
    let skipped = result.plan.order.len() - result.reports.len();
    if skipped > 0 {
        lines.push(format!("{} package(s) not attempted", skipped));
    }
    Ok(lines.join("\n"))
}

pub fn format_uninstall_result(result: &UninstallResult) -> String {
    let mut lines = Vec::new();
    for (id, removed) in &result.removed {
        lines.push(format!("uninstalled {} ({} nodes removed)", id, removed.len()));
        for path in removed {
            lines.push(format!("  D {}", path));
        }
    }
    lines.join("\n")
}

pub fn format_package_list(
    packages: &[RegisteredPackage],
    format: &str,
) -> Result<String, PackageError> {
    if format == "json" {
        return to_json(&packages);
    }
    if packages.is_empty() {
        return Ok("No packages registered.".to_string());
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Package", "Dependencies", "Installed"]);
    for package in packages {
        let deps: Vec<String> = package
            .metadata
            .dependencies
            .iter()
            .map(|d| d.to_string())
            .collect();
        table.add_row(vec![
            package.id().to_string(),
            if deps.is_empty() { "-".to_string() } else { deps.join(", ") },
            package
                .installed_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "no".to_string()),
        ]);
    }
    Ok(table.to_string())
}

pub fn format_usage(id: &PackageId, dependents: &[PackageId]) -> String {
    if dependents.is_empty() {
        return format!("No installed package depends on {}", id);
    }
    let mut lines = vec![format!("Installed packages depending on {}:", id)];
    lines.extend(dependents.iter().map(|d| format!("  - {}", d)));
    lines.join("\n")
}
