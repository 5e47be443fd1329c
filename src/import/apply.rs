//! Mode application: how one descriptor reconciles with one live node

use crate::error::{ImportError, RepositoryError};
use crate::import::engine::{Frame, Outcome, Session};
use crate::import::options::{AccessControlHandling, IdConflictPolicy, ImportMode};
use crate::tree::node_type::{FOLDER_TYPE, UNSTRUCTURED_TYPE};
use crate::tree::{ContentDescriptor, LiveNode, NodePath, PolicyKind};
use std::collections::BTreeSet;
use tracing::{debug, warn};
use uuid::Uuid;

/// Outcome of the identifier-conflict check for one descriptor.
#[derive(Debug, Default)]
struct Assigned {
    identifier: Option<String>,
    /// Child index taken over from a replaced sibling.
    slot: Option<usize>,
    /// The conflicting holder was removed.
    removed: bool,
}

impl Assigned {
    fn keep(identifier: &str) -> Self {
        Assigned {
            identifier: Some(identifier.to_string()),
            ..Assigned::default()
        }
    }

    fn fresh() -> Self {
        Assigned {
            identifier: Some(Uuid::new_v4().to_string()),
            ..Assigned::default()
        }
    }
}

fn constraint(path: &NodePath, message: String) -> ImportError {
    ImportError::ConstraintViolation {
        path: path.to_string(),
        message,
    }
}

impl Session<'_> {
    pub(super) fn import_content(
        &mut self,
        descriptor: &ContentDescriptor,
        existing: Option<LiveNode>,
        mode: ImportMode,
        preserve_folder_type: bool,
    ) -> Result<Outcome, ImportError> {
        let path = &descriptor.path;
        let Some(live) = existing else {
            if mode.is_properties_only() && self.under_preexisting_content(path)? {
                debug!(path = %path, %mode, "Not adding child to existing node");
                return Ok(Outcome::skip());
            }
            let assigned = self.resolve_identifier(descriptor)?;
            self.ensure_parent(path, &descriptor.primary_type)?;
            self.create_from(
                descriptor,
                &descriptor.primary_type,
                assigned.identifier.as_deref(),
            )?;
            if let Some(slot) = assigned.slot {
                self.restore_slot(path, slot)?;
            }
            self.added(path);
            return Ok(Outcome::descend(Frame::imported(descriptor, mode)));
        };

        let assigned = self.resolve_identifier(descriptor)?;
        let live = if assigned.removed {
            self.repo
                .find(path)?
                .ok_or_else(|| RepositoryError::NodeNotFound(path.to_string()))?
        } else {
            live
        };

        let target_type = if preserve_folder_type
            && self
                .repo
                .node_type(&live.primary_type)
                .map(|d| d.folder)
                .unwrap_or(false)
        {
            live.primary_type.clone()
        } else {
            descriptor.primary_type.clone()
        };

        let mut changed = match mode {
            ImportMode::Replace => self.replace(descriptor, &live, &target_type, &assigned)?,
            ImportMode::Update => {
                let mut changed = false;
                if target_type != live.primary_type {
                    self.repo.set_primary_type(path, &target_type)?;
                    changed = true;
                }
                changed |= self.add_mixins(descriptor, &live)?;
                changed | self.write_properties(descriptor, &live, true)?
            }
            ImportMode::UpdateProperties => self.write_properties(descriptor, &live, true)?,
            ImportMode::Merge => {
                let changed = self.add_mixins(descriptor, &live)?;
                changed | self.write_properties(descriptor, &live, false)?
            }
            ImportMode::MergeProperties => self.write_properties(descriptor, &live, false)?,
        };
        if let Some(slot) = assigned.slot {
            changed |= self.restore_slot(path, slot)?;
        }
        if changed {
            self.updated(path);
        }
        Ok(Outcome::descend(Frame::imported(descriptor, mode)))
    }

    /// The parent is covered content that existed before this run.
    fn under_preexisting_content(&mut self, path: &NodePath) -> Result<bool, ImportError> {
        let Some(parent) = path.parent() else {
            return Ok(false);
        };
        Ok(self.filter.covers(&parent)
            && !self.created.contains(&parent)
            && self.repo.exists(&parent)?)
    }

    /// Create missing ancestors of `path`, a node of type `child_type`.
    ///
    /// An ancestor the archive describes is created with its described type.
    /// Any other gets an arbitrated type able to hold the nearest described
    /// node below it.
    pub(super) fn ensure_parent(
        &mut self,
        path: &NodePath,
        child_type: &str,
    ) -> Result<(), ImportError> {
        let Some(parent) = path.parent() else {
            return Ok(());
        };
        if self.repo.exists(&parent)? {
            return Ok(());
        }
        let mut missing = Vec::new();
        for ancestor in path.ancestors() {
            if !self.repo.exists(&ancestor)? {
                missing.push(ancestor);
            }
        }

        let mut holds = Vec::with_capacity(missing.len());
        let mut below = child_type.to_string();
        for ancestor in missing.iter().rev() {
            holds.push(below.clone());
            if let Some((described, _)) = self.described(ancestor) {
                below = described;
            }
        }
        holds.reverse();

        for (ancestor, holds) in missing.iter().zip(holds) {
            let (node_type, mixins) = match self.described(ancestor) {
                Some(described) => described,
                None => (self.intermediate_type(ancestor, &holds)?, BTreeSet::new()),
            };
            debug!(path = %ancestor, %node_type, "Creating intermediate node");
            self.repo.create(ancestor, &node_type, &mixins, None)?;
            self.created.insert(ancestor.clone());
            self.added(ancestor);
        }
        Ok(())
    }

    /// First of the parent's default child type, the generic folder and the
    /// unstructured type that the parent accepts and that can hold `holds`.
    fn intermediate_type(&self, path: &NodePath, holds: &str) -> Result<String, ImportError> {
        let parent_type = match path.parent() {
            Some(parent) => self.repo.find(&parent)?.map(|n| n.primary_type),
            None => None,
        };
        let default = parent_type
            .as_deref()
            .and_then(|t| self.repo.node_type(t))
            .and_then(|d| d.default_child_type.clone());
        let fits = |candidate: &str| {
            parent_type
                .as_deref()
                .map(|parent| self.accepts(parent, candidate))
                .unwrap_or(true)
                && self.accepts(candidate, holds)
        };
        Ok(default
            .into_iter()
            .chain([FOLDER_TYPE.to_string(), UNSTRUCTURED_TYPE.to_string()])
            .find(|candidate| fits(candidate.as_str()))
            .unwrap_or_else(|| FOLDER_TYPE.to_string()))
    }

    /// Unknown parent types accept any child.
    fn accepts(&self, parent_type: &str, child_type: &str) -> bool {
        self.repo
            .node_type(parent_type)
            .map(|d| d.allows_child(child_type))
            .unwrap_or(true)
    }

    /// Check the descriptor identifier against other holders and apply the
    /// configured policy. Runs before anything is written for the node.
    fn resolve_identifier(
        &mut self,
        descriptor: &ContentDescriptor,
    ) -> Result<Assigned, ImportError> {
        let path = &descriptor.path;
        let Some(identifier) = descriptor.identifier.as_deref() else {
            return Ok(Assigned::default());
        };
        let holder = match self.lookup_identifier(identifier)? {
            Some(holder) if holder != *path => holder,
            _ => return Ok(Assigned::keep(identifier)),
        };

        debug!(
            path = %path,
            identifier,
            holder = %holder,
            policy = %self.options.id_conflict_policy,
            "Identifier conflict"
        );
        match self.options.id_conflict_policy {
            IdConflictPolicy::Fail => Err(ImportError::ReferentialIntegrity {
                path: path.to_string(),
                message: format!("identifier {} is already held by {}", identifier, holder),
            }),
            IdConflictPolicy::CreateNewId => Ok(Assigned::fresh()),
            IdConflictPolicy::ForceRemoveConflictingId => {
                if holder.is_ancestor_of(path) {
                    return Err(ImportError::ReferentialIntegrity {
                        path: path.to_string(),
                        message: format!(
                            "identifier {} is held by ancestor {} which cannot be removed",
                            identifier, holder
                        ),
                    });
                }
                self.remove_node(&holder)?;
                Ok(Assigned {
                    removed: true,
                    ..Assigned::keep(identifier)
                })
            }
            IdConflictPolicy::Legacy if holder.parent() == path.parent() => {
                let slot = self.sibling_slot(&holder, path)?;
                self.remove_node(&holder)?;
                Ok(Assigned {
                    identifier: Some(identifier.to_string()),
                    slot,
                    removed: true,
                })
            }
            IdConflictPolicy::Legacy => Ok(Assigned::fresh()),
        }
    }

    /// REPLACE on an existing node. Returns whether the node changed.
    fn replace(
        &mut self,
        descriptor: &ContentDescriptor,
        live: &LiveNode,
        target_type: &str,
        assigned: &Assigned,
    ) -> Result<bool, ImportError> {
        let path = &descriptor.path;
        let new_identifier = descriptor.identifier.is_some()
            && live.identifier.as_deref() != descriptor.identifier.as_deref();
        let structural = !path.is_root() && (new_identifier || target_type != live.primary_type);

        if structural {
            let identifier = if new_identifier {
                assigned.identifier.clone()
            } else {
                live.identifier.clone()
            };
            self.structural_replace(descriptor, live, target_type, identifier.as_deref())?;
            return Ok(true);
        }

        let mut changed = false;
        if target_type != live.primary_type {
            self.repo.set_primary_type(path, target_type)?;
            changed = true;
        }
        changed |= self.add_mixins(descriptor, live)?;
        for mixin in live.mixin_types.difference(&descriptor.mixin_types) {
            self.repo.remove_mixin(path, mixin)?;
            changed = true;
        }
        changed |= self.write_properties(descriptor, live, true)?;
        for name in live.properties.keys() {
            if descriptor.properties.contains_key(name) || self.repo.is_protected_property(name) {
                continue;
            }
            self.repo.remove_property(path, name)?;
            changed = true;
        }
        Ok(changed)
    }

    /// Remove and recreate the node, carrying over children that must survive:
    /// mandatory children of the new type, children outside the filter, and
    /// policy children the access-control handling keeps.
    ///
    /// All children are parked in a stash while the node is rebuilt. If the
    /// rebuild fails, the previous node and its children are put back.
    fn structural_replace(
        &mut self,
        descriptor: &ContentDescriptor,
        live: &LiveNode,
        target_type: &str,
        identifier: Option<&str>,
    ) -> Result<(), ImportError> {
        let path = &descriptor.path;
        let keep: Vec<String> = live
            .children
            .iter()
            .filter(|name| self.survives_replace(path, name, target_type))
            .cloned()
            .collect();
        self.check_replaceable(live, target_type, &keep)?;
        let slot = self.child_index(path)?;

        let stash = self.stash_children(live)?;
        if let Err(err) = self.rebuild(descriptor, target_type, identifier, stash.as_ref(), &keep) {
            warn!(path = %path, error = %err, "Replace failed, restoring previous node");
            self.restore_replaced(live, stash.as_ref())?;
            if let Some(slot) = slot {
                self.restore_slot(path, slot)?;
            }
            return Err(err);
        }
        if let Some(stash) = &stash {
            self.repo.remove(stash)?;
        }
        self.invalidate_identifiers();
        if let Some(slot) = slot {
            self.restore_slot(path, slot)?;
        }
        Ok(())
    }

    /// Refuse a replace the repository would reject, before anything moves.
    fn check_replaceable(
        &self,
        live: &LiveNode,
        target_type: &str,
        keep: &[String],
    ) -> Result<(), ImportError> {
        let path = &live.path;
        if let Some(parent) = path.parent() {
            if let Some(parent_node) = self.repo.find(&parent)? {
                if !self.accepts(&parent_node.primary_type, target_type) {
                    return Err(constraint(
                        path,
                        format!(
                            "{} does not allow child nodes of type {}",
                            parent_node.primary_type, target_type
                        ),
                    ));
                }
            }
        }
        for name in keep {
            if let Some(child) = self.repo.find(&path.join(name))? {
                if !self.accepts(target_type, &child.primary_type) {
                    return Err(constraint(
                        path,
                        format!(
                            "{} cannot keep child {} of type {}",
                            target_type, name, child.primary_type
                        ),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Move every child of `live` under a fresh stash node at the root.
    fn stash_children(&mut self, live: &LiveNode) -> Result<Option<NodePath>, ImportError> {
        if live.children.is_empty() {
            return Ok(None);
        }
        let path = &live.path;
        let stash =
            NodePath::root().join(&format!(".contentpkg-stash-{}", Uuid::new_v4().simple()));
        self.repo
            .create(&stash, UNSTRUCTURED_TYPE, &BTreeSet::new(), None)?;
        for (moved, name) in live.children.iter().enumerate() {
            if let Err(err) = self.repo.move_node(&path.join(name), &stash.join(name)) {
                for name in &live.children[..moved] {
                    self.repo.move_node(&stash.join(name), &path.join(name))?;
                }
                self.repo.reorder_children(path, &live.children)?;
                self.repo.remove(&stash)?;
                return Err(err.into());
            }
        }
        debug!(path = %path, stash = %stash, children = live.children.len(), "Stashed children");
        Ok(Some(stash))
    }

    fn rebuild(
        &mut self,
        descriptor: &ContentDescriptor,
        target_type: &str,
        identifier: Option<&str>,
        stash: Option<&NodePath>,
        keep: &[String],
    ) -> Result<(), ImportError> {
        let path = &descriptor.path;
        self.repo.remove(path)?;
        self.invalidate_identifiers();
        self.create_from(descriptor, target_type, identifier)?;
        if let Some(stash) = stash {
            for name in keep {
                self.repo.move_node(&stash.join(name), &path.join(name))?;
            }
        }
        Ok(())
    }

    /// Put back the node `live` described, with its children from the stash.
    fn restore_replaced(
        &mut self,
        live: &LiveNode,
        stash: Option<&NodePath>,
    ) -> Result<(), ImportError> {
        let path = &live.path;
        if let Some(current) = self.repo.find(path)? {
            if let Some(stash) = stash {
                for name in &current.children {
                    self.repo.move_node(&path.join(name), &stash.join(name))?;
                }
            }
            self.repo.remove(path)?;
        }
        self.repo.create(
            path,
            &live.primary_type,
            &live.mixin_types,
            live.identifier.as_deref(),
        )?;
        for (name, value) in &live.properties {
            if !self.repo.is_protected_property(name) {
                self.repo.set_property(path, name, value)?;
            }
        }
        if let Some(acl) = &live.policy {
            self.repo.write_policy(path, acl)?;
        }
        if let Some(stash) = stash {
            for name in &live.children {
                let stashed = stash.join(name);
                if self.repo.exists(&stashed)? {
                    self.repo.move_node(&stashed, &path.join(name))?;
                }
            }
            self.repo.remove(stash)?;
        }
        self.created.remove(path);
        self.invalidate_identifiers();
        Ok(())
    }

    fn survives_replace(&self, parent: &NodePath, name: &str, target_type: &str) -> bool {
        if let Some(kind) = PolicyKind::from_node_name(name) {
            return self.options.handling_for(kind) != AccessControlHandling::Overwrite;
        }
        if !self.filter.covers(&parent.join(name)) {
            return true;
        }
        self.repo
            .node_type(target_type)
            .map(|d| d.is_mandatory_child(name))
            .unwrap_or(false)
    }

    fn create_from(
        &mut self,
        descriptor: &ContentDescriptor,
        primary_type: &str,
        identifier: Option<&str>,
    ) -> Result<(), ImportError> {
        let path = &descriptor.path;
        self.repo
            .create(path, primary_type, &descriptor.mixin_types, identifier)?;
        if let Some(identifier) = identifier {
            self.remember_identifier(identifier, path);
        }
        self.created.insert(path.clone());
        self.mark_dirty();
        for (name, value) in &descriptor.properties {
            if self.skip_protected(path, name) {
                continue;
            }
            self.repo.set_property(path, name, value)?;
        }
        Ok(())
    }

    fn add_mixins(
        &mut self,
        descriptor: &ContentDescriptor,
        live: &LiveNode,
    ) -> Result<bool, ImportError> {
        let mut changed = false;
        for mixin in descriptor.mixin_types.difference(&live.mixin_types) {
            self.repo.add_mixin(&descriptor.path, mixin)?;
            changed = true;
        }
        Ok(changed)
    }

    /// Write descriptor properties; with `overwrite` false only absent ones.
    fn write_properties(
        &mut self,
        descriptor: &ContentDescriptor,
        live: &LiveNode,
        overwrite: bool,
    ) -> Result<bool, ImportError> {
        let path = &descriptor.path;
        let mut changed = false;
        for (name, value) in &descriptor.properties {
            if self.skip_protected(path, name) {
                continue;
            }
            match live.properties.get(name) {
                Some(current) if current == value => continue,
                Some(_) if !overwrite => continue,
                _ => {
                    self.repo.set_property(path, name, value)?;
                    changed = true;
                }
            }
        }
        Ok(changed)
    }

    fn child_index(&self, path: &NodePath) -> Result<Option<usize>, ImportError> {
        let Some(parent) = path.parent() else {
            return Ok(None);
        };
        Ok(self
            .repo
            .find(&parent)?
            .and_then(|p| p.children.iter().position(|c| c == path.name())))
    }

    /// Position of `holder` among its siblings, leaving out `path` itself.
    fn sibling_slot(
        &self,
        holder: &NodePath,
        path: &NodePath,
    ) -> Result<Option<usize>, ImportError> {
        let Some(parent) = holder.parent() else {
            return Ok(None);
        };
        Ok(self.repo.find(&parent)?.and_then(|p| {
            p.children
                .iter()
                .filter(|c| c.as_str() != path.name())
                .position(|c| c == holder.name())
        }))
    }

    /// Move `path` to position `slot` among its siblings. Returns whether the
    /// order changed.
    fn restore_slot(&mut self, path: &NodePath, slot: usize) -> Result<bool, ImportError> {
        let Some(parent) = path.parent() else {
            return Ok(false);
        };
        let Some(live) = self.repo.find(&parent)? else {
            return Ok(false);
        };
        let name = path.name().to_string();
        let mut order: Vec<String> = live
            .children
            .iter()
            .filter(|c| **c != name)
            .cloned()
            .collect();
        order.insert(slot.min(order.len()), name);
        if order == live.children {
            return Ok(false);
        }
        self.repo.reorder_children(&parent, &order)?;
        Ok(true)
    }
}
