//! Content descriptors and live nodes

use crate::tree::path::NodePath;
use crate::tree::policy::AccessControlList;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A single- or multi-valued node property.
///
/// Reference-typed values are carried as strings holding identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Boolean(bool),
    Long(i64),
    Double(f64),
    String(String),
    Multi(Vec<PropertyValue>),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, PropertyValue::Multi(_))
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Boolean(b) => write!(f, "{}", b),
            PropertyValue::Long(n) => write!(f, "{}", n),
            PropertyValue::Double(d) => write!(f, "{}", d),
            PropertyValue::String(s) => f.write_str(s),
            PropertyValue::Multi(values) => {
                let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Boolean(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Long(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Double(value)
    }
}

/// One node as read from an archive, consumed read-only by the importer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentDescriptor {
    pub path: NodePath,
    pub primary_type: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub mixin_types: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, PropertyValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    /// Explicit child order; children named here are represented by the archive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_order: Option<Vec<String>>,
    /// Entries of an access-control list, only on policy nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<AccessControlList>,
}

impl ContentDescriptor {
    pub fn new(path: NodePath, primary_type: impl Into<String>) -> Self {
        ContentDescriptor {
            path,
            primary_type: primary_type.into(),
            mixin_types: BTreeSet::new(),
            properties: BTreeMap::new(),
            identifier: None,
            child_order: None,
            policy: None,
        }
    }

    /// Descriptor for the policy node of `owner`, named and typed by the list's kind.
    pub fn for_policy(owner: &NodePath, acl: AccessControlList) -> Self {
        let mut descriptor = ContentDescriptor::new(
            owner.join(acl.kind.node_name()),
            acl.kind.node_type(),
        );
        descriptor.policy = Some(acl);
        descriptor
    }

    pub fn with_mixin(mut self, mixin: impl Into<String>) -> Self {
        self.mixin_types.insert(mixin.into());
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_child_order<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.child_order = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn name(&self) -> &str {
        self.path.name()
    }
}

/// The repository's view of an existing node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveNode {
    pub path: NodePath,
    pub primary_type: String,
    pub mixin_types: BTreeSet<String>,
    pub properties: BTreeMap<String, PropertyValue>,
    pub identifier: Option<String>,
    /// Child names in repository order.
    pub children: Vec<String>,
    pub policy: Option<AccessControlList>,
}

impl LiveNode {
    pub fn has_child(&self, name: &str) -> bool {
        self.children.iter().any(|c| c == name)
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }
}
