//! Archive collaborators
//!
//! An archive yields the package content as a path-ordered (pre-order)
//! stream of descriptors. Container formats stay behind the `Archive` trait;
//! the crate ships an in-memory archive and a directory layout.

pub mod directory;
pub mod memory;

pub use directory::{export_subtree, DirectoryArchive, DirectoryProvider};
pub use memory::{MemoryArchive, MemoryProvider};

use crate::error::ArchiveError;
use crate::package::PackageId;
use crate::tree::{ContentDescriptor, NodePath};

/// Lazy descriptor stream; parse errors surface at the offending entry.
pub type Entries<'a> = Box<dyn Iterator<Item = Result<ContentDescriptor, ArchiveError>> + 'a>;

/// Source of package content.
pub trait Archive {
    /// Open for reading. A strict open validates every entry up front.
    fn open(&mut self, strict: bool) -> Result<(), ArchiveError>;

    fn is_open(&self) -> bool;

    /// Entries in pre-order. Fails with `NotOpen` before `open`.
    fn entries(&self) -> Result<Entries<'_>, ArchiveError>;

    /// Archive restricted to `subpath`: the node itself and its children,
    /// or its whole subtree when `recursive`.
    fn sub_archive(&self, subpath: &NodePath, recursive: bool)
        -> Result<Box<dyn Archive>, ArchiveError>;

    fn close(&mut self) -> Result<(), ArchiveError>;
}

/// Resolves a package id to its archive.
pub trait ArchiveProvider {
    fn open_archive(&self, id: &PackageId) -> Result<Box<dyn Archive>, ArchiveError>;
}

/// Whether `path` belongs to a sub-archive rooted at `subpath`.
pub(crate) fn in_sub_archive(path: &NodePath, subpath: &NodePath, recursive: bool) -> bool {
    if recursive {
        subpath.is_ancestor_or_self(path)
    } else {
        path == subpath || subpath.is_parent_of(path)
    }
}
