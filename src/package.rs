//! Package identity, versions, dependency specs and metadata.

pub mod dependency;
pub mod id;
pub mod metadata;
pub mod version;

pub use dependency::Dependency;
pub use id::PackageId;
pub use metadata::PackageMetadata;
pub use version::{Version, VersionRange};
