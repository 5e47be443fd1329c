//! CLI parse: clap types for contentpkg. No behavior; definitions only.

use crate::import::{AccessControlHandling, DependencyHandling, IdConflictPolicy, ImportMode};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// contentpkg CLI - content package install and merge engine
#[derive(Parser)]
#[command(name = "contentpkg")]
#[command(about = "Install, merge and uninstall content packages in a content repository")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Workspace filter commands (show, check)
    Filter {
        #[command(subcommand)]
        command: FilterCommands,
    },
    /// Import a directory archive into the workspace repository
    Import {
        /// Archive directory
        archive: PathBuf,
        /// Repository path the archive directory maps to
        #[arg(long, default_value = "/")]
        mount: String,
        /// Filter definition (TOML); defaults to covering everything
        #[arg(long)]
        filter: Option<PathBuf>,
        #[command(flatten)]
        overrides: ImportOverrides,
        /// Run the import without saving the repository
        #[arg(long)]
        dry_run: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Export a repository subtree as a directory archive
    Export {
        /// Repository path to export
        root: String,
        /// Target directory
        target: PathBuf,
    },
    /// Package commands (register, install, uninstall, plan, list, usage)
    Package {
        #[command(subcommand)]
        command: PackageCommands,
    },
}

#[derive(Subcommand)]
pub enum FilterCommands {
    /// Print a filter definition in readable form
    Show {
        /// Filter definition (TOML)
        filter: PathBuf,
    },
    /// Report coverage and import mode for paths
    Check {
        /// Filter definition (TOML)
        filter: PathBuf,
        /// Repository paths to check
        #[arg(required = true)]
        paths: Vec<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

#[derive(Subcommand)]
pub enum PackageCommands {
    /// Register a package manifest (TOML) with the registry
    Register {
        manifest: PathBuf,
    },
    /// Install a registered package from the packages directory
    Install {
        /// Package id (group:name:version)
        id: String,
        #[command(flatten)]
        overrides: ImportOverrides,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Uninstall an installed package
    Uninstall {
        id: String,
        /// Dependency handling (ignore, strict, required, best_effort)
        #[arg(long)]
        dependencies: Option<DependencyHandling>,
    },
    /// Show the install (or uninstall) order without changing anything
    Plan {
        id: String,
        #[arg(long)]
        dependencies: Option<DependencyHandling>,
        /// Plan an uninstall instead of an install
        #[arg(long)]
        uninstall: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List registered packages
    List {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Installed packages depending on a package
    Usage {
        id: String,
    },
}

/// Per-run overrides of the `[import]` configuration.
#[derive(Args, Debug, Clone, Default)]
pub struct ImportOverrides {
    /// Default import mode (replace, update, merge, update_properties, merge_properties)
    #[arg(long)]
    pub mode: Option<ImportMode>,
    /// Identifier conflict policy (fail, create_new_id, force_remove_conflicting_id, legacy)
    #[arg(long)]
    pub id_conflict: Option<IdConflictPolicy>,
    /// Access control handling (ignore, overwrite, merge, merge_preserve)
    #[arg(long)]
    pub access_control: Option<AccessControlHandling>,
    /// Closed user group handling; defaults to --access-control
    #[arg(long)]
    pub cug: Option<AccessControlHandling>,
    /// Dependency handling (ignore, strict, required, best_effort)
    #[arg(long)]
    pub dependencies: Option<DependencyHandling>,
    /// Nodes per commit; 0 commits once at the end
    #[arg(long)]
    pub auto_save: Option<i64>,
    /// Stop at the first error
    #[arg(long)]
    pub strict: bool,
    /// Keep existing folder primary types
    #[arg(long)]
    pub keep_folder_types: bool,
}
