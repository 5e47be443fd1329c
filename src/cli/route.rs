//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::archive::{export_subtree, DirectoryArchive, DirectoryProvider};
use crate::cli::command_name;
use crate::cli::parse::{Commands, FilterCommands, ImportOverrides, PackageCommands};
use crate::cli::presentation::{
    format_filter_check, format_import_report, format_install_result, format_package_list,
    format_plan, format_uninstall_result, format_usage, PathCheck,
};
use crate::config::{ConfigLoader, PackConfig, StorageConfig};
use crate::dependency::{DependencyResolver, PackageRegistry, SledRegistry};
use crate::error::PackageError;
use crate::filter::WorkspaceFilter;
use crate::import::{ImportOptions, Importer};
use crate::manager::PackageManager;
use crate::package::{PackageId, PackageMetadata};
use crate::tree::{MemoryRepository, NodePath};
use std::path::{Path, PathBuf};
use tracing::{info, info_span};

/// Runtime context for CLI execution: workspace, loaded configuration and
/// resolved storage paths.
#[derive(Debug)]
pub struct RunContext {
    workspace_root: PathBuf,
    config: PackConfig,
    storage: StorageConfig,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, PackageError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        Self::from_config(workspace_root, config)
    }

    /// Create run context from an already loaded configuration.
    pub fn from_config(workspace_root: PathBuf, config: PackConfig) -> Result<Self, PackageError> {
        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            PackageError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;
        let storage = config.storage.resolve(&workspace_root);
        Ok(Self {
            workspace_root,
            config,
            storage,
        })
    }

    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, PackageError> {
        let span = info_span!("command", name = %command_name(command));
        let _entered = span.enter();
        match command {
            Commands::Filter { command } => self.handle_filter_command(command),
            Commands::Import {
                archive,
                mount,
                filter,
                overrides,
                dry_run,
                format,
            } => self.handle_import(archive, mount, filter.as_deref(), overrides, *dry_run, format),
            Commands::Export { root, target } => {
                let repo = self.load_repository()?;
                let root = NodePath::parse(root)?;
                let written = export_subtree(&repo, &root, target)?;
                Ok(format!("Exported {} nodes to {}", written, target.display()))
            }
            Commands::Package { command } => self.handle_package_command(command),
        }
    }

    fn handle_filter_command(&self, command: &FilterCommands) -> Result<String, PackageError> {
        match command {
            FilterCommands::Show { filter } => Ok(WorkspaceFilter::load(filter)?.dump()),
            FilterCommands::Check {
                filter,
                paths,
                format,
            } => {
                let filter = WorkspaceFilter::load(filter)?;
                let checks = paths
                    .iter()
                    .map(|raw| {
                        let path = NodePath::parse(raw)?;
                        Ok(PathCheck {
                            path: path.to_string(),
                            covered: filter.covers(&path),
                            root: filter.root_for(&path).map(|set| set.root().to_string()),
                            mode: filter.mode_for(&path),
                            skipped: filter.skips_subtree(&path),
                        })
                    })
                    .collect::<Result<Vec<_>, PackageError>>()?;
                format_filter_check(&checks, format)
            }
        }
    }

    fn handle_import(
        &self,
        archive: &Path,
        mount: &str,
        filter: Option<&Path>,
        overrides: &ImportOverrides,
        dry_run: bool,
        format: &str,
    ) -> Result<String, PackageError> {
        let mut options = self.import_options(overrides);
        if let Some(filter) = filter {
            options = options.with_filter(WorkspaceFilter::load(filter)?);
        }
        let mut repo = self.load_repository()?;
        let mut archive = DirectoryArchive::mounted(archive, NodePath::parse(mount)?);
        let report = Importer::new(options).run_archive(&mut archive, &mut repo)?;
        if dry_run {
            info!("Dry run, repository not saved");
        } else {
            self.save_repository(&repo)?;
        }
        format_import_report(&report, format)
    }

    fn handle_package_command(&self, command: &PackageCommands) -> Result<String, PackageError> {
        match command {
            PackageCommands::Register { manifest } => {
                let metadata = PackageMetadata::load(manifest)?;
                let registry = self.open_registry()?;
                let record = registry.register(metadata)?;
                registry.flush()?;
                Ok(format!("Registered {}", record.id()))
            }
            PackageCommands::Install {
                id,
                overrides,
                format,
            } => {
                let id: PackageId = id.parse()?;
                let options = self.import_options(overrides);
                let registry = self.open_registry()?;
                let provider = DirectoryProvider::new(&self.storage.packages_dir);
                let mut repo = self.load_repository()?;
                let result = PackageManager::new(&registry, &provider).install(&id, &mut repo, &options);
                // Committed batches persist even when the install fails.
                self.save_repository(&repo)?;
                registry.flush()?;
                format_install_result(&result?, format)
            }
            PackageCommands::Uninstall { id, dependencies } => {
                let id: PackageId = id.parse()?;
                let mut options = self.import_options(&ImportOverrides::default());
                if let Some(handling) = dependencies {
                    options = options.with_dependency_handling(*handling);
                }
                let registry = self.open_registry()?;
                let provider = DirectoryProvider::new(&self.storage.packages_dir);
                let mut repo = self.load_repository()?;
                let result = PackageManager::new(&registry, &provider).uninstall(&id, &mut repo, &options)?;
                self.save_repository(&repo)?;
                registry.flush()?;
                Ok(format_uninstall_result(&result))
            }
            PackageCommands::Plan {
                id,
                dependencies,
                uninstall,
                format,
            } => {
                let id: PackageId = id.parse()?;
                let handling = dependencies.unwrap_or(self.config.import.dependencies);
                let registry = self.open_registry()?;
                let resolver = DependencyResolver::new(&registry);
                let plan = if *uninstall {
                    resolver.resolve_uninstall_order(&id, handling)?
                } else {
                    resolver.resolve_install_order(&id, handling)?
                };
                format_plan(&plan, format)
            }
            PackageCommands::List { format } => {
                let registry = self.open_registry()?;
                format_package_list(&registry.packages()?, format)
            }
            PackageCommands::Usage { id } => {
                let id: PackageId = id.parse()?;
                let registry = self.open_registry()?;
                let dependents = DependencyResolver::new(&registry).usage(&id)?;
                Ok(format_usage(&id, &dependents))
            }
        }
    }

    /// Configuration defaults with the command-line overrides applied.
    pub fn import_options(&self, overrides: &ImportOverrides) -> ImportOptions {
        let mut options = ImportOptions::from_settings(&self.config.import);
        if let Some(mode) = overrides.mode {
            options = options.with_mode(mode);
        }
        if let Some(policy) = overrides.id_conflict {
            options = options.with_id_conflict_policy(policy);
        }
        if let Some(handling) = overrides.access_control {
            options = options.with_access_control(handling);
        }
        if let Some(handling) = overrides.cug {
            options = options.with_cug_handling(handling);
        }
        if let Some(handling) = overrides.dependencies {
            options = options.with_dependency_handling(handling);
        }
        if let Some(threshold) = overrides.auto_save {
            options = options.with_auto_save_threshold(threshold);
        }
        if overrides.strict {
            options = options.strict(true);
        }
        if overrides.keep_folder_types {
            options = options.with_overwrite_primary_types_of_folders(false);
        }
        options
    }

    fn open_registry(&self) -> Result<SledRegistry, PackageError> {
        if let Some(parent) = self.storage.registry_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                PackageError::ConfigError(format!("Failed to create registry directory: {}", e))
            })?;
        }
        Ok(SledRegistry::new(&self.storage.registry_path)?)
    }

    fn load_repository(&self) -> Result<MemoryRepository, PackageError> {
        Ok(MemoryRepository::load(&self.storage.snapshot_path)?)
    }

    fn save_repository(&self, repo: &MemoryRepository) -> Result<(), PackageError> {
        if let Some(parent) = self.storage.snapshot_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                PackageError::ConfigError(format!("Failed to create snapshot directory: {}", e))
            })?;
        }
        Ok(repo.save(&self.storage.snapshot_path)?)
    }
}
