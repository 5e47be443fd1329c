//! Persistence layer for the package registry

use crate::dependency::registry::{PackageRegistry, RegisteredPackage};
use crate::error::RegistryError;
use crate::package::{PackageId, PackageMetadata};
use chrono::{DateTime, Utc};
use std::path::Path;

/// Sled-based implementation of PackageRegistry
///
/// Keys are the textual package id, values bincode-encoded
/// `RegisteredPackage` records.
pub struct SledRegistry {
    db: sled::Db,
}

impl SledRegistry {
    /// Open (or create) the registry database at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, RegistryError> {
        let db = sled::open(path).map_err(|e| {
            RegistryError::Storage(format!("Failed to open sled database: {}", e))
        })?;
        Ok(Self { db })
    }

    /// Get the underlying sled database (for advanced operations)
    pub fn db(&self) -> &sled::Db {
        &self.db
    }

    pub fn flush(&self) -> Result<(), RegistryError> {
        self.db
            .flush()
            .map_err(|e| RegistryError::Storage(format!("Failed to flush registry: {}", e)))?;
        Ok(())
    }

    fn key(id: &PackageId) -> Vec<u8> {
        id.to_string().into_bytes()
    }

    fn decode(value: &[u8]) -> Result<RegisteredPackage, RegistryError> {
        bincode::deserialize(value).map_err(|e| {
            RegistryError::Serialization(format!("Failed to deserialize package record: {}", e))
        })
    }

    fn put(&self, record: &RegisteredPackage) -> Result<(), RegistryError> {
        let value = bincode::serialize(record).map_err(|e| {
            RegistryError::Serialization(format!("Failed to serialize package record: {}", e))
        })?;
        self.db
            .insert(Self::key(record.id()), value)
            .map_err(|e| RegistryError::Storage(format!("Failed to put package record: {}", e)))?;
        Ok(())
    }

    fn update<F>(&self, id: &PackageId, apply: F) -> Result<(), RegistryError>
    where
        F: FnOnce(&mut RegisteredPackage),
    {
        let mut record = self
            .get(id)?
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;
        apply(&mut record);
        self.put(&record)
    }
}

impl PackageRegistry for SledRegistry {
    fn register(&self, metadata: PackageMetadata) -> Result<RegisteredPackage, RegistryError> {
        let sequence = self
            .db
            .generate_id()
            .map_err(|e| RegistryError::Storage(format!("Failed to allocate sequence: {}", e)))?;
        let installed_at = self.get(&metadata.id)?.and_then(|p| p.installed_at);
        let record = RegisteredPackage {
            metadata,
            installed_at,
            sequence,
        };
        self.put(&record)?;
        Ok(record)
    }

    fn unregister(&self, id: &PackageId) -> Result<bool, RegistryError> {
        let removed = self.db.remove(Self::key(id)).map_err(|e| {
            RegistryError::Storage(format!("Failed to remove package record: {}", e))
        })?;
        Ok(removed.is_some())
    }

    fn get(&self, id: &PackageId) -> Result<Option<RegisteredPackage>, RegistryError> {
        match self
            .db
            .get(Self::key(id))
            .map_err(|e| RegistryError::Storage(format!("Failed to get package record: {}", e)))?
        {
            Some(value) => Ok(Some(Self::decode(&value)?)),
            None => Ok(None),
        }
    }

    fn packages(&self) -> Result<Vec<RegisteredPackage>, RegistryError> {
        let mut packages = Vec::new();
        for item in self.db.iter() {
            let (_, value) = item.map_err(|e| {
                RegistryError::Storage(format!("Failed to iterate registry: {}", e))
            })?;
            packages.push(Self::decode(&value)?);
        }
        packages.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(packages)
    }

    fn mark_installed(&self, id: &PackageId, at: DateTime<Utc>) -> Result<(), RegistryError> {
        self.update(id, |record| record.installed_at = Some(at))
    }

    fn mark_uninstalled(&self, id: &PackageId) -> Result<(), RegistryError> {
        self.update(id, |record| record.installed_at = None)
    }
}
