//! Repository collaborator interface
//!
//! The importer never touches storage directly; every mutation goes through
//! this trait and becomes durable only on `commit`.

use crate::error::RepositoryError;
use crate::tree::node::{LiveNode, PropertyValue};
use crate::tree::node_type::NodeTypeDefinition;
use crate::tree::path::NodePath;
use crate::tree::policy::AccessControlList;
use std::collections::BTreeSet;

pub trait Repository {
    fn find(&self, path: &NodePath) -> Result<Option<LiveNode>, RepositoryError>;

    fn find_by_identifier(&self, identifier: &str) -> Result<Option<NodePath>, RepositoryError>;

    /// Create a node; the parent must exist and accept the type.
    fn create(
        &mut self,
        path: &NodePath,
        primary_type: &str,
        mixins: &BTreeSet<String>,
        identifier: Option<&str>,
    ) -> Result<(), RepositoryError>;

    /// Remove a node and its subtree.
    fn remove(&mut self, path: &NodePath) -> Result<(), RepositoryError>;

    /// Move a subtree; the node is appended to the destination parent's children.
    fn move_node(&mut self, from: &NodePath, to: &NodePath) -> Result<(), RepositoryError>;

    fn set_primary_type(&mut self, path: &NodePath, primary_type: &str)
        -> Result<(), RepositoryError>;

    fn add_mixin(&mut self, path: &NodePath, mixin: &str) -> Result<(), RepositoryError>;

    fn remove_mixin(&mut self, path: &NodePath, mixin: &str) -> Result<(), RepositoryError>;

    fn set_property(
        &mut self,
        path: &NodePath,
        name: &str,
        value: &PropertyValue,
    ) -> Result<(), RepositoryError>;

    fn remove_property(&mut self, path: &NodePath, name: &str) -> Result<(), RepositoryError>;

    /// Children named in `order` move to the front in that order; the rest keep
    /// their relative order after them.
    fn reorder_children(&mut self, path: &NodePath, order: &[String])
        -> Result<(), RepositoryError>;

    /// Replace the list stored on the policy node at `path`, creating the node
    /// when absent.
    fn write_policy(
        &mut self,
        path: &NodePath,
        acl: &AccessControlList,
    ) -> Result<(), RepositoryError>;

    fn commit(&mut self) -> Result<(), RepositoryError>;

    fn node_type(&self, name: &str) -> Option<&NodeTypeDefinition>;

    fn is_protected_property(&self, name: &str) -> bool;

    fn exists(&self, path: &NodePath) -> Result<bool, RepositoryError> {
        Ok(self.find(path)?.is_some())
    }
}
