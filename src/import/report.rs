//! Outcome of an import run

use crate::error::ImportError;
use crate::tree::NodePath;
use serde::Serialize;

/// An error or diagnostic attached to a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathFailure {
    pub path: String,
    pub kind: &'static str,
    pub message: String,
}

impl PathFailure {
    pub fn new(path: &NodePath, error: &ImportError) -> Self {
        PathFailure {
            path: error.path().unwrap_or(path.as_str()).to_string(),
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub added: Vec<NodePath>,
    pub updated: Vec<NodePath>,
    pub removed: Vec<NodePath>,
    /// Fatal per-path errors recorded in non-strict runs.
    pub errors: Vec<PathFailure>,
    /// Non-fatal diagnostics such as skipped protected properties.
    pub diagnostics: Vec<PathFailure>,
    pub commits: usize,
}

impl ImportReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Paths created or modified by the run.
    pub fn installed_or_updated(&self) -> impl Iterator<Item = &NodePath> {
        self.added.iter().chain(self.updated.iter())
    }

    pub fn summary(&self) -> String {
        format!(
            "{} added, {} updated, {} removed, {} errors, {} commits",
            self.added.len(),
            self.updated.len(),
            self.removed.len(),
            self.errors.len(),
            self.commits
        )
    }
}
