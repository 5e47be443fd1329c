//! Access-control lists attached to content nodes

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Which kind of access policy a policy node carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Hierarchy-scoped access-control list.
    Acl,
    /// Closed user group.
    Cug,
    /// Principal-scoped list, not bound to the content hierarchy.
    PrincipalAcl,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 3] = [PolicyKind::Acl, PolicyKind::Cug, PolicyKind::PrincipalAcl];

    pub fn node_name(&self) -> &'static str {
        match self {
            PolicyKind::Acl => "rep:policy",
            PolicyKind::Cug => "rep:cugPolicy",
            PolicyKind::PrincipalAcl => "rep:principalPolicy",
        }
    }

    pub fn node_type(&self) -> &'static str {
        match self {
            PolicyKind::Acl => "rep:ACL",
            PolicyKind::Cug => "rep:CugPolicy",
            PolicyKind::PrincipalAcl => "rep:PrincipalPolicy",
        }
    }

    pub fn from_node_name(name: &str) -> Option<PolicyKind> {
        Self::ALL.into_iter().find(|k| k.node_name() == name)
    }

    pub fn from_node_type(primary_type: &str) -> Option<PolicyKind> {
        Self::ALL.into_iter().find(|k| k.node_type() == primary_type)
    }
}

/// A single grant or denial.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessControlEntry {
    pub principal: String,
    #[serde(default = "default_allow")]
    pub allow: bool,
    #[serde(default)]
    pub privileges: BTreeSet<String>,
    #[serde(default)]
    pub restrictions: BTreeMap<String, String>,
}

fn default_allow() -> bool {
    true
}

impl AccessControlEntry {
    pub fn allow(principal: impl Into<String>) -> Self {
        AccessControlEntry {
            principal: principal.into(),
            allow: true,
            privileges: BTreeSet::new(),
            restrictions: BTreeMap::new(),
        }
    }

    pub fn deny(principal: impl Into<String>) -> Self {
        AccessControlEntry {
            allow: false,
            ..Self::allow(principal)
        }
    }

    pub fn with_privilege(mut self, privilege: impl Into<String>) -> Self {
        self.privileges.insert(privilege.into());
        self
    }

    pub fn with_restriction(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.restrictions.insert(name.into(), value.into());
        self
    }

    /// Same principal, polarity and restrictions; privileges may differ.
    pub fn same_target(&self, other: &AccessControlEntry) -> bool {
        self.principal == other.principal
            && self.allow == other.allow
            && self.restrictions == other.restrictions
    }
}

/// An ordered list of entries of one policy kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControlList {
    pub kind: PolicyKind,
    #[serde(default)]
    pub entries: Vec<AccessControlEntry>,
}

impl AccessControlList {
    pub fn new(kind: PolicyKind) -> Self {
        AccessControlList {
            kind,
            entries: Vec::new(),
        }
    }

    pub fn with_entry(mut self, entry: AccessControlEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn contains(&self, entry: &AccessControlEntry) -> bool {
        self.entries.iter().any(|e| e == entry)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
