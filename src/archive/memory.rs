//! In-memory archive

use crate::archive::{in_sub_archive, Archive, ArchiveProvider, Entries};
use crate::error::ArchiveError;
use crate::package::PackageId;
use crate::tree::{ContentDescriptor, NodePath};
use std::collections::{HashMap, HashSet};

/// Archive over descriptors held in memory, yielded in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    descriptors: Vec<ContentDescriptor>,
    open: bool,
    close_count: usize,
}

impl MemoryArchive {
    pub fn new(descriptors: Vec<ContentDescriptor>) -> Self {
        MemoryArchive {
            descriptors,
            open: false,
            close_count: 0,
        }
    }

    pub fn push(&mut self, descriptor: ContentDescriptor) {
        self.descriptors.push(descriptor);
    }

    pub fn descriptors(&self) -> &[ContentDescriptor] {
        &self.descriptors
    }

    /// Times `close` ran on an open archive.
    pub fn close_count(&self) -> usize {
        self.close_count
    }

    /// Every entry after the first must follow its parent, and identifiers
    /// must be unique.
    fn validate(&self) -> Result<(), ArchiveError> {
        let mut seen: HashSet<&NodePath> = HashSet::new();
        let mut identifiers: HashMap<&str, &NodePath> = HashMap::new();
        for descriptor in &self.descriptors {
            let path = &descriptor.path;
            if let Some(parent) = path.parent() {
                if !seen.is_empty() && !seen.contains(&parent) {
                    let orphan = self
                        .descriptors
                        .first()
                        .map(|first| !first.path.is_ancestor_of(path))
                        .unwrap_or(true);
                    if orphan {
                        return Err(ArchiveError::Parse {
                            path: path.to_string(),
                            message: format!("entry precedes its parent {}", parent),
                        });
                    }
                }
            }
            if let Some(identifier) = descriptor.identifier.as_deref() {
                if let Some(other) = identifiers.insert(identifier, path) {
                    return Err(ArchiveError::Parse {
                        path: path.to_string(),
                        message: format!("identifier {} already used by {}", identifier, other),
                    });
                }
            }
            seen.insert(path);
        }
        Ok(())
    }
}

impl Archive for MemoryArchive {
    fn open(&mut self, strict: bool) -> Result<(), ArchiveError> {
        if strict {
            self.validate()?;
        }
        self.open = true;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn entries(&self) -> Result<Entries<'_>, ArchiveError> {
        if !self.open {
            return Err(ArchiveError::NotOpen);
        }
        Ok(Box::new(self.descriptors.iter().cloned().map(Ok)))
    }

    fn sub_archive(
        &self,
        subpath: &NodePath,
        recursive: bool,
    ) -> Result<Box<dyn Archive>, ArchiveError> {
        let descriptors = self
            .descriptors
            .iter()
            .filter(|d| in_sub_archive(&d.path, subpath, recursive))
            .cloned()
            .collect();
        Ok(Box::new(MemoryArchive::new(descriptors)))
    }

    fn close(&mut self) -> Result<(), ArchiveError> {
        if self.open {
            self.open = false;
            self.close_count += 1;
        }
        Ok(())
    }
}

/// Archives keyed by package id.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    archives: HashMap<PackageId, Vec<ContentDescriptor>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: PackageId, descriptors: Vec<ContentDescriptor>) {
        self.archives.insert(id, descriptors);
    }

    pub fn with_archive(mut self, id: PackageId, descriptors: Vec<ContentDescriptor>) -> Self {
        self.insert(id, descriptors);
        self
    }
}

impl ArchiveProvider for MemoryProvider {
    fn open_archive(&self, id: &PackageId) -> Result<Box<dyn Archive>, ArchiveError> {
        self.archives
            .get(id)
            .map(|descriptors| Box::new(MemoryArchive::new(descriptors.clone())) as Box<dyn Archive>)
            .ok_or_else(|| ArchiveError::NotFound(id.to_string()))
    }
}
