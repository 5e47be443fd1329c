//! Package metadata: identity, dependencies and the workspace filter.

use crate::error::PackageError;
use crate::filter::WorkspaceFilter;
use crate::package::dependency::Dependency;
use crate::package::id::PackageId;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Metadata owned by a package. Immutable once the package is opened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageMetadata {
    pub id: PackageId,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub filter: WorkspaceFilter,
}

impl PackageMetadata {
    pub fn new(id: PackageId) -> Self {
        PackageMetadata {
            id,
            dependencies: Vec::new(),
            filter: WorkspaceFilter::default(),
        }
    }

    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn with_filter(mut self, filter: WorkspaceFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Parse a TOML package manifest.
    pub fn from_toml_str(raw: &str) -> Result<Self, PackageError> {
        toml::from_str(raw)
            .map_err(|e| PackageError::ConfigError(format!("Invalid package manifest: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self, PackageError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PackageError::ConfigError(format!(
                "Failed to read package manifest {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&raw)
    }
}
