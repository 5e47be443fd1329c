//! Ordered path filters anchored at one root

use crate::error::FilterError;
use crate::filter::path_filter::PathFilter;
use crate::import::ImportMode;
use crate::tree::NodePath;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSet {
    root: NodePath,
    rules: Vec<PathFilter>,
    mode: Option<ImportMode>,
}

impl FilterSet {
    pub fn new(root: NodePath) -> Self {
        FilterSet {
            root,
            rules: Vec::new(),
            mode: None,
        }
    }

    pub fn parse(root: &str) -> Result<Self, FilterError> {
        Ok(Self::new(NodePath::parse(root)?))
    }

    pub fn with_mode(mut self, mode: ImportMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn include(mut self, pattern: &str) -> Result<Self, FilterError> {
        self.rules.push(PathFilter::include(pattern)?);
        Ok(self)
    }

    pub fn exclude(mut self, pattern: &str) -> Result<Self, FilterError> {
        self.rules.push(PathFilter::exclude(pattern)?);
        Ok(self)
    }

    pub fn add_rule(&mut self, rule: PathFilter) {
        self.rules.push(rule);
    }

    pub fn root(&self) -> &NodePath {
        &self.root
    }

    pub fn rules(&self) -> &[PathFilter] {
        &self.rules
    }

    /// Explicit mode override, if declared.
    pub fn mode(&self) -> Option<ImportMode> {
        self.mode
    }

    /// The root itself or anything below it, regardless of patterns.
    pub fn contains(&self, path: &NodePath) -> bool {
        self.root.is_ancestor_or_self(path)
    }

    /// Under the root and accepted by the last matching rule.
    ///
    /// With no matching rule, an include-first rule list excludes and any other
    /// list includes. This departs from a plain implicit-include default: a set
    /// whose first rule is an include acts as an allow-list, so a path none of
    /// its rules match stays out of the import.
    pub fn covers(&self, path: &NodePath) -> bool {
        if !self.contains(path) {
            return false;
        }
        match self.rules.iter().rev().find(|rule| rule.matches(path)) {
            Some(rule) => rule.is_include(),
            None => self.rules.first().map(|r| !r.is_include()).unwrap_or(true),
        }
    }
}
