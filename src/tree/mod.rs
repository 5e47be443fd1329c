//! Live Content Tree
//!
//! Node paths, content descriptors, access-control lists, node types, and the
//! repository collaborator the merge engine issues mutations against.

pub mod memory;
pub mod node;
pub mod node_type;
pub mod path;
pub mod policy;
pub mod repository;

pub use memory::MemoryRepository;
pub use node::{ContentDescriptor, LiveNode, PropertyValue};
pub use node_type::{NodeTypeDefinition, NodeTypeRegistry};
pub use path::NodePath;
pub use policy::{AccessControlEntry, AccessControlList, PolicyKind};
pub use repository::Repository;
