//! Configuration System
//!
//! Layered configuration for the package manager: merge-policy defaults, the
//! global user file, workspace files and environment overrides. The `import`
//! section seeds `ImportOptions`, `storage` locates the registry, the
//! repository snapshot and the package archives.

use crate::import::{AccessControlHandling, DependencyHandling, IdConflictPolicy, ImportMode};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Defaults for import runs
    #[serde(default)]
    pub import: ImportSettings,

    /// Storage paths
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Import defaults; every field can be overridden per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    pub mode: ImportMode,
    pub id_conflict: IdConflictPolicy,
    pub access_control: AccessControlHandling,
    /// Falls back to `access_control` when unset.
    pub cug: Option<AccessControlHandling>,
    pub dependencies: DependencyHandling,
    pub auto_save_threshold: i64,
    pub strict: bool,
    pub overwrite_primary_types_of_folders: bool,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            mode: ImportMode::Replace,
            id_conflict: IdConflictPolicy::Fail,
            access_control: AccessControlHandling::Ignore,
            cug: None,
            dependencies: DependencyHandling::Ignore,
            auto_save_threshold: 0,
            strict: false,
            overwrite_primary_types_of_folders: true,
        }
    }
}

/// Storage locations, relative paths resolve against the workspace root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_registry_path")]
    pub registry_path: PathBuf,

    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,

    #[serde(default = "default_packages_dir")]
    pub packages_dir: PathBuf,
}

fn default_registry_path() -> PathBuf {
    PathBuf::from(".contentpkg/registry")
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from(".contentpkg/repository.json")
}

fn default_packages_dir() -> PathBuf {
    PathBuf::from(".contentpkg/packages")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            registry_path: default_registry_path(),
            snapshot_path: default_snapshot_path(),
            packages_dir: default_packages_dir(),
        }
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.registry_path.as_os_str().is_empty() {
            return Err("Registry path cannot be empty".to_string());
        }
        if self.snapshot_path.as_os_str().is_empty() {
            return Err("Snapshot path cannot be empty".to_string());
        }
        if self.packages_dir.as_os_str().is_empty() {
            return Err("Packages directory cannot be empty".to_string());
        }
        Ok(())
    }

    /// Resolve the storage paths against a workspace root.
    pub fn resolve(&self, workspace_root: &Path) -> StorageConfig {
        let rooted = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                workspace_root.join(p)
            }
        };
        StorageConfig {
            registry_path: rooted(&self.registry_path),
            snapshot_path: rooted(&self.snapshot_path),
            packages_dir: rooted(&self.packages_dir),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Logging(String),
    Import(String),
    Storage(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
            ValidationError::Import(msg) => write!(f, "Import: {}", msg),
            ValidationError::Storage(msg) => write!(f, "Storage: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl PackConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }
        if self.import.auto_save_threshold < 0 {
            errors.push(ValidationError::Import(format!(
                "auto_save_threshold must be 0 (single commit) or positive, got {}",
                self.import.auto_save_threshold
            )));
        }
        if let Err(e) = self.storage.validate() {
            errors.push(ValidationError::Storage(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
