//! contentpkg: Content Package Install and Merge Engine
//!
//! Installs content packages into a hierarchical content repository. A
//! workspace filter scopes what a package owns, the import engine merges an
//! archive's descriptor stream into the live tree under one of five import
//! modes, identifier conflicts and access control policies are reconciled,
//! and the package manager resolves dependency order across installs and
//! uninstalls.

pub mod archive;
pub mod cli;
pub mod config;
pub mod dependency;
pub mod error;
pub mod filter;
pub mod import;
pub mod logging;
pub mod manager;
pub mod package;
pub mod tree;

pub use error::PackageError;
pub use filter::{FilterSet, PathFilter, WorkspaceFilter};
pub use import::{
    AccessControlHandling, DependencyHandling, IdConflictPolicy, ImportMode, ImportOptions,
    ImportReport, Importer,
};
pub use manager::PackageManager;
pub use package::{Dependency, PackageId, PackageMetadata};
pub use tree::{ContentDescriptor, MemoryRepository, NodePath, Repository};
