//! Workspace filter: ordered filter sets with longest-enclosing-root lookup

use crate::error::FilterError;
use crate::filter::definition::FilterDefinition;
use crate::filter::filter_set::FilterSet;
use crate::import::ImportMode;
use crate::tree::NodePath;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

/// Ordered list of filter sets.
///
/// A set may only be added if its root is not equal to or an ancestor of an
/// earlier root, so nested roots always come after the roots enclosing them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FilterDefinition", into = "FilterDefinition")]
pub struct WorkspaceFilter {
    sets: Vec<FilterSet>,
}

impl WorkspaceFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single root at `/` with no rules.
    pub fn covering_all() -> Self {
        WorkspaceFilter {
            sets: vec![FilterSet::new(NodePath::root())],
        }
    }

    pub fn with_set(mut self, set: FilterSet) -> Result<Self, FilterError> {
        self.add(set)?;
        Ok(self)
    }

    pub fn add(&mut self, set: FilterSet) -> Result<(), FilterError> {
        if let Some(existing) = self
            .sets
            .iter()
            .find(|s| set.root().is_ancestor_or_self(s.root()))
        {
            return Err(FilterError::Overlap {
                root: set.root().to_string(),
                existing: existing.root().to_string(),
            });
        }
        self.sets.push(set);
        Ok(())
    }

    pub fn sets(&self) -> &[FilterSet] {
        &self.sets
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Deepest filter set whose root is `path` or an ancestor of it.
    pub fn root_for(&self, path: &NodePath) -> Option<&FilterSet> {
        self.sets
            .iter()
            .filter(|s| s.contains(path))
            .max_by_key(|s| s.root().depth())
    }

    /// Under some root, regardless of patterns.
    pub fn contains(&self, path: &NodePath) -> bool {
        self.root_for(path).is_some()
    }

    pub fn covers(&self, path: &NodePath) -> bool {
        self.root_for(path).map(|s| s.covers(path)).unwrap_or(false)
    }

    /// Mode of the deepest enclosing root, REPLACE when the set declares none.
    /// `None` means no root applies.
    pub fn mode_for(&self, path: &NodePath) -> Option<ImportMode> {
        self.mode_for_or(path, ImportMode::Replace)
    }

    /// As [`WorkspaceFilter::mode_for`] with a caller-supplied fallback for sets
    /// without an explicit mode.
    pub fn mode_for_or(&self, path: &NodePath, fallback: ImportMode) -> Option<ImportMode> {
        self.root_for(path).map(|s| s.mode().unwrap_or(fallback))
    }

    /// Whether some root lies strictly below `path`.
    pub fn is_ancestor_of_any_root(&self, path: &NodePath) -> bool {
        self.sets.iter().any(|s| path.is_ancestor_of(s.root()))
    }

    /// Traversal may skip `path` and its whole subtree.
    pub fn skips_subtree(&self, path: &NodePath) -> bool {
        !self.contains(path) && !self.is_ancestor_of_any_root(path)
    }

    /// Human-readable rendering, one root per block.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for set in &self.sets {
            match set.mode() {
                Some(mode) => {
                    let _ = writeln!(out, "{} (mode: {})", set.root(), mode);
                }
                None => {
                    let _ = writeln!(out, "{}", set.root());
                }
            }
            for rule in set.rules() {
                let sign = if rule.is_include() { '+' } else { '-' };
                let _ = writeln!(out, "  {} {}", sign, rule.pattern());
            }
        }
        out
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, FilterError> {
        let definition: FilterDefinition =
            toml::from_str(raw).map_err(|e| FilterError::Definition(e.to_string()))?;
        definition.build()
    }

    pub fn load(path: &Path) -> Result<Self, FilterError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            FilterError::Definition(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&raw)
    }
}
