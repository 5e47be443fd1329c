//! CLI domain: parse, route, help and presentation only.
//! No domain orchestration; single route table dispatches to domain services.

mod help;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use parse::{Cli, Commands, FilterCommands, ImportOverrides, PackageCommands};
pub use presentation::{
    format_filter_check, format_import_report, format_install_result, format_package_list,
    format_plan, format_uninstall_result, format_usage, PathCheck,
};
pub use route::RunContext;
