//! Declared package dependencies

use crate::error::ParseIdError;
use crate::package::id::PackageId;
use crate::package::version::VersionRange;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A dependency on another package: `group:name[:range]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Dependency {
    group: String,
    name: String,
    range: VersionRange,
}

impl Dependency {
    pub fn new(group: impl Into<String>, name: impl Into<String>, range: VersionRange) -> Self {
        Dependency {
            group: group.into(),
            name: name.into(),
            range,
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn range(&self) -> &VersionRange {
        &self.range
    }

    /// Group and name match and the id's version falls in range.
    pub fn matches(&self, id: &PackageId) -> bool {
        self.group == id.group() && self.name == id.name() && self.range.contains(id.version())
    }
}

impl FromStr for Dependency {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().splitn(3, ':').collect();
        let (group, name, range) = match parts.as_slice() {
            [group, name] => (*group, *name, VersionRange::any()),
            [group, name, range] => (*group, *name, range.parse()?),
            _ => return Err(ParseIdError::InvalidDependency(s.to_string())),
        };
        if name.trim().is_empty() {
            return Err(ParseIdError::InvalidDependency(s.to_string()));
        }
        Ok(Dependency::new(group, name, range))
    }
}

impl TryFrom<String> for Dependency {
    type Error = ParseIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Dependency> for String {
    fn from(dep: Dependency) -> Self {
        dep.to_string()
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.range.is_any() {
            write!(f, "{}:{}", self.group, self.name)
        } else {
            write!(f, "{}:{}:{}", self.group, self.name, self.range)
        }
    }
}
