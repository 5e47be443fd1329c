//! Repository path normalization utilities

use crate::error::InvalidPath;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use unicode_normalization::UnicodeNormalization;

/// Absolute, normalized repository path.
///
/// Normalization:
/// 1. Unicode is normalized to NFC
/// 2. Repeated separators collapse to one
/// 3. Trailing slashes are removed (except root)
///
/// `.` and `..` segments are rejected rather than resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodePath(String);

impl NodePath {
    pub fn root() -> Self {
        NodePath("/".to_string())
    }

    pub fn parse(raw: &str) -> Result<Self, InvalidPath> {
        if !raw.starts_with('/') {
            return Err(InvalidPath(raw.to_string()));
        }
        let normalized: String = raw.nfc().collect();
        let mut segments = Vec::new();
        for segment in normalized.split('/') {
            match segment {
                "" => continue,
                "." | ".." => return Err(InvalidPath(raw.to_string())),
                s => segments.push(s),
            }
        }
        if segments.is_empty() {
            return Ok(Self::root());
        }
        Ok(NodePath(format!("/{}", segments.join("/"))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Last segment; empty for root.
    pub fn name(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[idx + 1..],
            None => "",
        }
    }

    pub fn parent(&self) -> Option<NodePath> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) => Some(Self::root()),
            Some(idx) => Some(NodePath(self.0[..idx].to_string())),
            None => None,
        }
    }

    /// Append a single child name. The name must not contain `/`.
    pub fn join(&self, name: &str) -> NodePath {
        debug_assert!(!name.contains('/'), "child name contains separator");
        if self.is_root() {
            NodePath(format!("/{}", name))
        } else {
            NodePath(format!("{}/{}", self.0, name))
        }
    }

    /// Strict ancestor test.
    pub fn is_ancestor_of(&self, other: &NodePath) -> bool {
        if self.is_root() {
            return !other.is_root();
        }
        other.0.len() > self.0.len()
            && other.0.starts_with(&self.0)
            && other.0.as_bytes()[self.0.len()] == b'/'
    }

    pub fn is_ancestor_or_self(&self, other: &NodePath) -> bool {
        self == other || self.is_ancestor_of(other)
    }

    pub fn is_parent_of(&self, other: &NodePath) -> bool {
        other.parent().as_ref() == Some(self)
    }

    /// Number of segments; root has depth 0.
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Strict ancestors, from the root down to the parent.
    pub fn ancestors(&self) -> Vec<NodePath> {
        let mut out = Vec::new();
        let mut current = self.parent();
        while let Some(p) = current {
            current = p.parent();
            out.push(p);
        }
        out.reverse();
        out
    }

    /// Re-anchor `self` from `from` onto `to`. `from` must be an ancestor or self.
    pub fn rebase(&self, from: &NodePath, to: &NodePath) -> Option<NodePath> {
        if self == from {
            return Some(to.clone());
        }
        if !from.is_ancestor_of(self) {
            return None;
        }
        let suffix = if from.is_root() {
            &self.0[1..]
        } else {
            &self.0[from.0.len() + 1..]
        };
        Some(suffix.split('/').fold(to.clone(), |acc, s| acc.join(s)))
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NodePath {
    type Err = InvalidPath;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodePath::parse(s)
    }
}

impl TryFrom<String> for NodePath {
    type Error = InvalidPath;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        NodePath::parse(&value)
    }
}

impl From<NodePath> for String {
    fn from(path: NodePath) -> Self {
        path.0
    }
}

impl AsRef<str> for NodePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
