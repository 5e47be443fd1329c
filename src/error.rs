//! Error types for the content package manager.

use crate::package::{Dependency, PackageId};
use thiserror::Error;

fn join_ids(ids: &[PackageId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn join_dependencies(deps: &[Dependency]) -> String {
    deps.iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A repository path that is not absolute or contains illegal segments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid path: {0}")]
pub struct InvalidPath(pub String);

/// Malformed package identifiers, dependency specs and version ranges.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseIdError {
    #[error("Invalid package id: {0}")]
    InvalidId(String),

    #[error("Invalid dependency: {0}")]
    InvalidDependency(String),

    #[error("Invalid version range: {0}")]
    InvalidRange(String),
}

/// Workspace filter configuration errors
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Invalid filter pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Invalid filter root: {0}")]
    InvalidRoot(#[from] InvalidPath),

    #[error("Filter root {root} overlaps earlier root {existing}; later roots must be nested under earlier ones")]
    Overlap { root: String, existing: String },

    #[error("Failed to read filter definition: {0}")]
    Definition(String),
}

/// Errors raised by the repository collaborator
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Node already exists: {0}")]
    NodeExists(String),

    #[error("Constraint violation at {path}: {message}")]
    ConstraintViolation { path: String, message: String },

    #[error("Commit failed: {0}")]
    CommitFailed(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Repository I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors raised by archive collaborators
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Archive is not open")]
    NotOpen,

    #[error("Parse error at {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Archive not found: {0}")]
    NotFound(String),

    #[error("Archive I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors raised while merging a descriptor stream into a live tree
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Referential integrity violation at {path}: {message}")]
    ReferentialIntegrity { path: String, message: String },

    #[error("Constraint violation at {path}: {message}")]
    ConstraintViolation { path: String, message: String },

    #[error("Parse error at {path}: {message}")]
    Parse { path: String, message: String },

    /// Non-fatal: a protected or auto-managed property was not written.
    #[error("Protected property {property} skipped at {path}")]
    ProtectedAttributeSkipped { path: String, property: String },

    #[error("Repository error: {0}")]
    Repository(RepositoryError),

    #[error("Archive error: {0}")]
    Archive(ArchiveError),
}

impl From<RepositoryError> for ImportError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::ConstraintViolation { path, message } => {
                ImportError::ConstraintViolation { path, message }
            }
            other => ImportError::Repository(other),
        }
    }
}

impl From<ArchiveError> for ImportError {
    fn from(err: ArchiveError) -> Self {
        match err {
            ArchiveError::Parse { path, message } => ImportError::Parse { path, message },
            other => ImportError::Archive(other),
        }
    }
}

impl ImportError {
    /// Path the error is attached to, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            ImportError::ReferentialIntegrity { path, .. }
            | ImportError::ConstraintViolation { path, .. }
            | ImportError::Parse { path, .. }
            | ImportError::ProtectedAttributeSkipped { path, .. } => Some(path),
            ImportError::Repository(RepositoryError::NodeNotFound(path))
            | ImportError::Repository(RepositoryError::NodeExists(path)) => Some(path),
            _ => None,
        }
    }

    pub fn is_fatal(&self) -> bool {
        !matches!(self, ImportError::ProtectedAttributeSkipped { .. })
    }

    /// Short machine-readable kind, used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            ImportError::ReferentialIntegrity { .. } => "referential_integrity",
            ImportError::ConstraintViolation { .. } => "constraint_violation",
            ImportError::Parse { .. } => "parse",
            ImportError::ProtectedAttributeSkipped { .. } => "protected_attribute_skipped",
            ImportError::Repository(_) => "repository",
            ImportError::Archive(_) => "archive",
        }
    }
}

/// Installed-package registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Package not registered: {0}")]
    NotFound(PackageId),

    #[error("Registry storage error: {0}")]
    Storage(String),

    #[error("Registry serialization error: {0}")]
    Serialization(String),
}

/// Dependency resolution errors
#[derive(Debug, Error)]
pub enum DependencyError {
    #[error("Unresolved dependencies for {package}: {}", join_dependencies(.dependencies))]
    Unresolved {
        package: PackageId,
        dependencies: Vec<Dependency>,
    },

    #[error("Cyclic dependency: {}", join_ids(.cycle))]
    Cyclic { cycle: Vec<PackageId> },

    #[error("Package {package} is still required by {}", join_ids(.dependents))]
    InUse {
        package: PackageId,
        dependents: Vec<PackageId>,
    },

    #[error("Unknown package: {0}")]
    UnknownPackage(PackageId),

    #[error("Package is not installed: {0}")]
    NotInstalled(PackageId),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}

/// Crate-level error aggregating every subsystem
#[derive(Debug, Error)]
pub enum PackageError {
    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    #[error("Import failed: {0}")]
    Import(#[from] ImportError),

    #[error("Dependency error: {0}")]
    Dependency(#[from] DependencyError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("{0}")]
    Parse(#[from] ParseIdError),

    #[error("{0}")]
    Path(#[from] InvalidPath),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Output error: {0}")]
    Output(String),
}

impl From<config::ConfigError> for PackageError {
    fn from(err: config::ConfigError) -> Self {
        PackageError::ConfigError(err.to_string())
    }
}
