//! Installed-package registry

use crate::error::RegistryError;
use crate::package::{PackageId, PackageMetadata};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A package known to the registry, installed or merely available.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredPackage {
    pub metadata: PackageMetadata,
    /// Set while the package is installed.
    pub installed_at: Option<DateTime<Utc>>,
    /// Registration sequence; later registrations win version ties.
    pub sequence: u64,
}

impl RegisteredPackage {
    pub fn id(&self) -> &PackageId {
        &self.metadata.id
    }

    pub fn is_installed(&self) -> bool {
        self.installed_at.is_some()
    }
}

/// Storage for package metadata and installation markers.
///
/// Markers change only through `mark_installed`/`mark_uninstalled`, which the
/// package manager calls after a successful run.
pub trait PackageRegistry: Send + Sync {
    /// Register (or re-register) a package. Re-registering keeps the
    /// installation marker and takes a new sequence number.
    fn register(&self, metadata: PackageMetadata) -> Result<RegisteredPackage, RegistryError>;

    fn unregister(&self, id: &PackageId) -> Result<bool, RegistryError>;

    fn get(&self, id: &PackageId) -> Result<Option<RegisteredPackage>, RegistryError>;

    /// All packages ordered by id.
    fn packages(&self) -> Result<Vec<RegisteredPackage>, RegistryError>;

    fn mark_installed(&self, id: &PackageId, at: DateTime<Utc>) -> Result<(), RegistryError>;

    fn mark_uninstalled(&self, id: &PackageId) -> Result<(), RegistryError>;

    fn installed(&self) -> Result<Vec<RegisteredPackage>, RegistryError> {
        Ok(self
            .packages()?
            .into_iter()
            .filter(RegisteredPackage::is_installed)
            .collect())
    }

    fn is_installed(&self, id: &PackageId) -> Result<bool, RegistryError> {
        Ok(self.get(id)?.map(|p| p.is_installed()).unwrap_or(false))
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    packages: BTreeMap<PackageId, RegisteredPackage>,
    next_sequence: u64,
}

/// In-memory registry.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    state: RwLock<RegistryState>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.state.read().packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().packages.is_empty()
    }
}

impl PackageRegistry for MemoryRegistry {
    fn register(&self, metadata: PackageMetadata) -> Result<RegisteredPackage, RegistryError> {
        let mut state = self.state.write();
        state.next_sequence += 1;
        let sequence = state.next_sequence;
        let installed_at = state
            .packages
            .get(&metadata.id)
            .and_then(|p| p.installed_at);
        let record = RegisteredPackage {
            metadata,
            installed_at,
            sequence,
        };
        state.packages.insert(record.id().clone(), record.clone());
        Ok(record)
    }

    fn unregister(&self, id: &PackageId) -> Result<bool, RegistryError> {
        Ok(self.state.write().packages.remove(id).is_some())
    }

    fn get(&self, id: &PackageId) -> Result<Option<RegisteredPackage>, RegistryError> {
        Ok(self.state.read().packages.get(id).cloned())
    }

    fn packages(&self) -> Result<Vec<RegisteredPackage>, RegistryError> {
        Ok(self.state.read().packages.values().cloned().collect())
    }

    fn mark_installed(&self, id: &PackageId, at: DateTime<Utc>) -> Result<(), RegistryError> {
        let mut state = self.state.write();
        let record = state
            .packages
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;
        record.installed_at = Some(at);
        Ok(())
    }

    fn mark_uninstalled(&self, id: &PackageId) -> Result<(), RegistryError> {
        let mut state = self.state.write();
        let record = state
            .packages
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;
        record.installed_at = None;
        Ok(())
    }
}
