//! In-memory repository with JSON snapshots
//!
//! Mutations land in a working tree; `commit` copies the working tree over the
//! saved tree. `revert` discards everything since the last commit.

use crate::error::RepositoryError;
use crate::tree::node::{LiveNode, PropertyValue};
use crate::tree::node_type::{NodeTypeDefinition, NodeTypeRegistry};
use crate::tree::path::NodePath;
use crate::tree::policy::{AccessControlList, PolicyKind};
use crate::tree::repository::Repository;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use tracing::debug;

const ROOT_TYPE: &str = "rep:root";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StoredNode {
    primary_type: String,
    #[serde(default)]
    mixins: BTreeSet<String>,
    #[serde(default)]
    properties: BTreeMap<String, PropertyValue>,
    #[serde(default)]
    identifier: Option<String>,
    #[serde(default)]
    children: Vec<String>,
    #[serde(default)]
    policy: Option<AccessControlList>,
}

impl StoredNode {
    fn new(primary_type: &str) -> Self {
        StoredNode {
            primary_type: primary_type.to_string(),
            mixins: BTreeSet::new(),
            properties: BTreeMap::new(),
            identifier: None,
            children: Vec::new(),
            policy: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    nodes: BTreeMap<NodePath, StoredNode>,
}

/// Reference live tree used by tests and the CLI.
#[derive(Debug, Clone)]
pub struct MemoryRepository {
    nodes: BTreeMap<NodePath, StoredNode>,
    saved: BTreeMap<NodePath, StoredNode>,
    identifiers: HashMap<String, NodePath>,
    node_types: NodeTypeRegistry,
    commits: usize,
    fail_commit_at: Option<usize>,
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::with_node_types(NodeTypeRegistry::with_builtins())
    }

    pub fn with_node_types(node_types: NodeTypeRegistry) -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(NodePath::root(), StoredNode::new(ROOT_TYPE));
        MemoryRepository {
            saved: nodes.clone(),
            nodes,
            identifiers: HashMap::new(),
            node_types,
            commits: 0,
            fail_commit_at: None,
        }
    }

    /// Load a snapshot written by [`MemoryRepository::save`]. A missing file
    /// yields an empty repository.
    pub fn load(path: &Path) -> Result<Self, RepositoryError> {
        let mut repo = Self::new();
        if !path.exists() {
            return Ok(repo);
        }
        let raw = std::fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&raw).map_err(|e| {
            RepositoryError::Snapshot(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        if !snapshot.nodes.contains_key(&NodePath::root()) {
            return Err(RepositoryError::Snapshot(format!(
                "Snapshot {} has no root node",
                path.display()
            )));
        }
        repo.nodes = snapshot.nodes;
        repo.saved = repo.nodes.clone();
        repo.rebuild_identifier_index();
        Ok(repo)
    }

    /// Write the committed state as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), RepositoryError> {
        let snapshot = Snapshot {
            nodes: self.saved.clone(),
        };
        let raw = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| RepositoryError::Snapshot(format!("Failed to serialize snapshot: {}", e)))?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, raw)?;
        Ok(())
    }

    /// Discard every mutation since the last commit.
    pub fn revert(&mut self) {
        self.nodes = self.saved.clone();
        self.rebuild_identifier_index();
    }

    /// Number of successful commits.
    pub fn commit_count(&self) -> usize {
        self.commits
    }

    pub fn has_pending_changes(&self) -> bool {
        self.nodes != self.saved
    }

    /// Make the `n`th commit (1-based) fail. Used to exercise partial progress.
    pub fn fail_commit_at(&mut self, n: usize) {
        self.fail_commit_at = Some(n);
    }

    pub fn node_types(&self) -> &NodeTypeRegistry {
        &self.node_types
    }

    pub fn node_types_mut(&mut self) -> &mut NodeTypeRegistry {
        &mut self.node_types
    }

    /// All working-tree paths in sorted order.
    pub fn paths(&self) -> Vec<NodePath> {
        self.nodes.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Create every missing ancestor and the node itself with `primary_type`.
    pub fn ensure_path(
        &mut self,
        path: &NodePath,
        primary_type: &str,
    ) -> Result<(), RepositoryError> {
        for ancestor in path.ancestors().into_iter().skip(1) {
            if !self.nodes.contains_key(&ancestor) {
                self.create(&ancestor, "nt:unstructured", &BTreeSet::new(), None)?;
            }
        }
        if !self.nodes.contains_key(path) {
            self.create(path, primary_type, &BTreeSet::new(), None)?;
        }
        Ok(())
    }

    fn rebuild_identifier_index(&mut self) {
        self.identifiers = self
            .nodes
            .iter()
            .filter_map(|(path, node)| node.identifier.clone().map(|id| (id, path.clone())))
            .collect();
    }

    fn node_mut(&mut self, path: &NodePath) -> Result<&mut StoredNode, RepositoryError> {
        self.nodes
            .get_mut(path)
            .ok_or_else(|| RepositoryError::NodeNotFound(path.to_string()))
    }

    fn subtree_paths(&self, path: &NodePath) -> Vec<NodePath> {
        self.nodes
            .range(path.clone()..)
            .map(|(p, _)| p)
            .take_while(|p| p.as_str().starts_with(path.as_str()))
            .filter(|p| path.is_ancestor_or_self(p))
            .cloned()
            .collect()
    }

    fn check_child_allowed(
        &self,
        parent: &NodePath,
        child: &NodePath,
        child_type: &str,
    ) -> Result<(), RepositoryError> {
        let parent_node = self
            .nodes
            .get(parent)
            .ok_or_else(|| RepositoryError::NodeNotFound(parent.to_string()))?;
        if !self
            .node_types
            .allows_child(&parent_node.primary_type, child_type)
        {
            return Err(RepositoryError::ConstraintViolation {
                path: child.to_string(),
                message: format!(
                    "{} does not allow child nodes of type {}",
                    parent_node.primary_type, child_type
                ),
            });
        }
        Ok(())
    }
}

impl Repository for MemoryRepository {
    fn find(&self, path: &NodePath) -> Result<Option<LiveNode>, RepositoryError> {
        Ok(self.nodes.get(path).map(|node| LiveNode {
            path: path.clone(),
            primary_type: node.primary_type.clone(),
            mixin_types: node.mixins.clone(),
            properties: node.properties.clone(),
            identifier: node.identifier.clone(),
            children: node.children.clone(),
            policy: node.policy.clone(),
        }))
    }

    fn find_by_identifier(&self, identifier: &str) -> Result<Option<NodePath>, RepositoryError> {
        Ok(self.identifiers.get(identifier).cloned())
    }

    fn create(
        &mut self,
        path: &NodePath,
        primary_type: &str,
        mixins: &BTreeSet<String>,
        identifier: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let parent = path
            .parent()
            .ok_or_else(|| RepositoryError::NodeExists(path.to_string()))?;
        if self.nodes.contains_key(path) {
            return Err(RepositoryError::NodeExists(path.to_string()));
        }
        self.check_child_allowed(&parent, path, primary_type)?;
        if let Some(id) = identifier {
            if let Some(holder) = self.identifiers.get(id) {
                return Err(RepositoryError::ConstraintViolation {
                    path: path.to_string(),
                    message: format!("identifier {} already held by {}", id, holder),
                });
            }
        }

        let mut node = StoredNode::new(primary_type);
        node.mixins = mixins.clone();
        node.identifier = identifier.map(str::to_string);
        if let Some(id) = identifier {
            self.identifiers.insert(id.to_string(), path.clone());
        }
        self.nodes.insert(path.clone(), node);
        self.node_mut(&parent)?.children.push(path.name().to_string());
        debug!(path = %path, primary_type, "Created node");
        Ok(())
    }

    fn remove(&mut self, path: &NodePath) -> Result<(), RepositoryError> {
        if path.is_root() {
            return Err(RepositoryError::ConstraintViolation {
                path: path.to_string(),
                message: "the root node cannot be removed".to_string(),
            });
        }
        if !self.nodes.contains_key(path) {
            return Err(RepositoryError::NodeNotFound(path.to_string()));
        }
        for p in self.subtree_paths(path) {
            if let Some(node) = self.nodes.remove(&p) {
                if let Some(id) = node.identifier {
                    self.identifiers.remove(&id);
                }
            }
        }
        if let Some(parent) = path.parent() {
            let name = path.name().to_string();
            self.node_mut(&parent)?.children.retain(|c| *c != name);
        }
        debug!(path = %path, "Removed node");
        Ok(())
    }

    fn move_node(&mut self, from: &NodePath, to: &NodePath) -> Result<(), RepositoryError> {
        if from.is_root() || from.is_ancestor_or_self(to) {
            return Err(RepositoryError::ConstraintViolation {
                path: from.to_string(),
                message: format!("cannot move {} to {}", from, to),
            });
        }
        if self.nodes.contains_key(to) {
            return Err(RepositoryError::NodeExists(to.to_string()));
        }
        let primary_type = self
            .nodes
            .get(from)
            .map(|n| n.primary_type.clone())
            .ok_or_else(|| RepositoryError::NodeNotFound(from.to_string()))?;
        let to_parent = to
            .parent()
            .ok_or_else(|| RepositoryError::NodeExists(to.to_string()))?;
        self.check_child_allowed(&to_parent, to, &primary_type)?;

        for old in self.subtree_paths(from) {
            if let (Some(node), Some(new)) = (self.nodes.remove(&old), old.rebase(from, to)) {
                if let Some(id) = &node.identifier {
                    self.identifiers.insert(id.clone(), new.clone());
                }
                self.nodes.insert(new, node);
            }
        }
        if let Some(from_parent) = from.parent() {
            let name = from.name().to_string();
            self.node_mut(&from_parent)?.children.retain(|c| *c != name);
        }
        self.node_mut(&to_parent)?.children.push(to.name().to_string());
        debug!(from = %from, to = %to, "Moved node");
        Ok(())
    }

    fn set_primary_type(
        &mut self,
        path: &NodePath,
        primary_type: &str,
    ) -> Result<(), RepositoryError> {
        if let Some(parent) = path.parent() {
            self.check_child_allowed(&parent, path, primary_type)?;
        }
        self.node_mut(path)?.primary_type = primary_type.to_string();
        Ok(())
    }

    fn add_mixin(&mut self, path: &NodePath, mixin: &str) -> Result<(), RepositoryError> {
        self.node_mut(path)?.mixins.insert(mixin.to_string());
        Ok(())
    }

    fn remove_mixin(&mut self, path: &NodePath, mixin: &str) -> Result<(), RepositoryError> {
        self.node_mut(path)?.mixins.remove(mixin);
        Ok(())
    }

    fn set_property(
        &mut self,
        path: &NodePath,
        name: &str,
        value: &PropertyValue,
    ) -> Result<(), RepositoryError> {
        if self.node_types.is_protected(name) {
            return Err(RepositoryError::ConstraintViolation {
                path: path.to_string(),
                message: format!("property {} is protected", name),
            });
        }
        self.node_mut(path)?
            .properties
            .insert(name.to_string(), value.clone());
        Ok(())
    }

    fn remove_property(&mut self, path: &NodePath, name: &str) -> Result<(), RepositoryError> {
        self.node_mut(path)?.properties.remove(name);
        Ok(())
    }

    fn reorder_children(
        &mut self,
        path: &NodePath,
        order: &[String],
    ) -> Result<(), RepositoryError> {
        let node = self.node_mut(path)?;
        let mut reordered: Vec<String> = order
            .iter()
            .filter(|name| node.children.contains(*name))
            .cloned()
            .collect();
        let rest: Vec<String> = node
            .children
            .iter()
            .filter(|c| !reordered.contains(*c))
            .cloned()
            .collect();
        reordered.extend(rest);
        node.children = reordered;
        Ok(())
    }

    fn write_policy(
        &mut self,
        path: &NodePath,
        acl: &AccessControlList,
    ) -> Result<(), RepositoryError> {
        if PolicyKind::from_node_name(path.name()) != Some(acl.kind) {
            return Err(RepositoryError::ConstraintViolation {
                path: path.to_string(),
                message: format!("{} is not a {} node", path, acl.kind.node_name()),
            });
        }
        if !self.nodes.contains_key(path) {
            self.create(path, acl.kind.node_type(), &BTreeSet::new(), None)?;
        }
        self.node_mut(path)?.policy = Some(acl.clone());
        Ok(())
    }

    fn commit(&mut self) -> Result<(), RepositoryError> {
        let attempt = self.commits + 1;
        if self.fail_commit_at == Some(attempt) {
            return Err(RepositoryError::CommitFailed(format!(
                "commit {} rejected",
                attempt
            )));
        }
        self.saved = self.nodes.clone();
        self.commits = attempt;
        debug!(commits = self.commits, "Committed");
        Ok(())
    }

    fn node_type(&self, name: &str) -> Option<&NodeTypeDefinition> {
        self.node_types.get(name)
    }

    fn is_protected_property(&self, name: &str) -> bool {
        self.node_types.is_protected(name)
    }
}
