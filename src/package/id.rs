//! Package identity

use crate::error::ParseIdError;
use crate::package::version::Version;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Immutable package identity: `group:name:version`.
///
/// Ordering is group, then name, then version. The version may be empty,
/// meaning the package is unversioned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageId {
    group: String,
    name: String,
    version: Version,
}

impl PackageId {
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<Version>,
    ) -> Result<Self, ParseIdError> {
        let group = group.into();
        let name = name.into();
        if name.trim().is_empty() || name.contains(':') || group.contains(':') {
            return Err(ParseIdError::InvalidId(format!("{}:{}", group, name)));
        }
        Ok(PackageId {
            group,
            name,
            version: version.into(),
        })
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Same group and name, any version.
    pub fn same_package(&self, other: &PackageId) -> bool {
        self.group == other.group && self.name == other.name
    }
}

impl FromStr for PackageId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().splitn(3, ':').collect();
        match parts.as_slice() {
            [group, name] => PackageId::new(*group, *name, Version::unversioned()),
            [group, name, version] => PackageId::new(*group, *name, Version::new(*version)),
            _ => Err(ParseIdError::InvalidId(s.to_string())),
        }
    }
}

impl TryFrom<String> for PackageId {
    type Error = ParseIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PackageId> for String {
    fn from(id: PackageId) -> Self {
        id.to_string()
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version.is_empty() {
            write!(f, "{}:{}", self.group, self.name)
        } else {
            write!(f, "{}:{}:{}", self.group, self.name, self.version)
        }
    }
}
