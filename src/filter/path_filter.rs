//! Include/exclude pattern matched against a full path

use crate::error::FilterError;
use crate::tree::NodePath;
use regex::Regex;

/// A regular expression plus polarity. The pattern must match the whole path.
#[derive(Debug, Clone)]
pub struct PathFilter {
    pattern: String,
    regex: Regex,
    include: bool,
}

impl PathFilter {
    pub fn new(pattern: &str, include: bool) -> Result<Self, FilterError> {
        let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
            FilterError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            }
        })?;
        Ok(PathFilter {
            pattern: pattern.to_string(),
            regex,
            include,
        })
    }

    pub fn include(pattern: &str) -> Result<Self, FilterError> {
        Self::new(pattern, true)
    }

    pub fn exclude(pattern: &str) -> Result<Self, FilterError> {
        Self::new(pattern, false)
    }

    pub fn matches(&self, path: &NodePath) -> bool {
        self.regex.is_match(path.as_str())
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_include(&self) -> bool {
        self.include
    }
}

impl PartialEq for PathFilter {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern && self.include == other.include
    }
}

impl Eq for PathFilter {}
