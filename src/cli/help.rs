//! CLI help and command-name contract for logging and routing.

use crate::cli::parse::{Commands, FilterCommands, PackageCommands};

/// Command name string for log spans (e.g. "filter.check", "package.install").
pub fn command_name(command: &Commands) -> String {
    match command {
        Commands::Filter { command } => format!("filter.{}", filter_command_name(command)),
        Commands::Import { .. } => "import".to_string(),
        Commands::Export { .. } => "export".to_string(),
        Commands::Package { command } => format!("package.{}", package_command_name(command)),
    }
}

pub fn filter_command_name(command: &FilterCommands) -> &'static str {
    match command {
        FilterCommands::Show { .. } => "show",
        FilterCommands::Check { .. } => "check",
    }
}

pub fn package_command_name(command: &PackageCommands) -> &'static str {
    match command {
        PackageCommands::Register { .. } => "register",
        PackageCommands::Install { .. } => "install",
        PackageCommands::Uninstall { .. } => "uninstall",
        PackageCommands::Plan { .. } => "plan",
        PackageCommands::List { .. } => "list",
        PackageCommands::Usage { .. } => "usage",
    }
}
