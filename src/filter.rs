//! Workspace Filter
//!
//! Scopes an install to a set of roots. Each root carries ordered
//! include/exclude patterns and an optional import-mode override; when roots
//! nest, the deepest enclosing root decides.

pub mod definition;
pub mod filter_set;
pub mod path_filter;
pub mod workspace;

pub use definition::{FilterDefinition, FilterSetDefinition, RuleDefinition};
pub use filter_set::FilterSet;
pub use path_filter::PathFilter;
pub use workspace::WorkspaceFilter;
