//! Dependency Resolution
//!
//! Installed-package registries and the resolver that orders installs and
//! uninstalls under a `DependencyHandling` policy.

pub mod persistence;
pub mod registry;
pub mod resolver;

pub use persistence::SledRegistry;
pub use registry::{MemoryRegistry, PackageRegistry, RegisteredPackage};
pub use resolver::{DependencyPlan, DependencyResolver, UnresolvedDependency};
