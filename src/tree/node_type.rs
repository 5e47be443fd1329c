//! Node type definitions known to a repository

use crate::tree::policy::PolicyKind;
use std::collections::{BTreeSet, HashMap};

/// Generic folder type used when no better intermediate type applies.
pub const FOLDER_TYPE: &str = "nt:folder";

/// Type that accepts any child, the last resort for intermediates.
pub const UNSTRUCTURED_TYPE: &str = "nt:unstructured";

/// Constraints the repository enforces for one primary type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTypeDefinition {
    pub name: String,
    /// Type given to children created without an explicit type.
    pub default_child_type: Option<String>,
    /// `None` allows any child type.
    pub allowed_child_types: Option<BTreeSet<String>>,
    /// Children that must exist for the node to be valid.
    pub mandatory_children: Vec<String>,
    pub folder: bool,
    pub file: bool,
}

impl NodeTypeDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        NodeTypeDefinition {
            name: name.into(),
            default_child_type: None,
            allowed_child_types: None,
            mandatory_children: Vec::new(),
            folder: false,
            file: false,
        }
    }

    pub fn with_default_child_type(mut self, child_type: impl Into<String>) -> Self {
        self.default_child_type = Some(child_type.into());
        self
    }

    pub fn with_allowed_child_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_child_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_mandatory_child(mut self, name: impl Into<String>) -> Self {
        self.mandatory_children.push(name.into());
        self
    }

    pub fn folder(mut self) -> Self {
        self.folder = true;
        self
    }

    pub fn file(mut self) -> Self {
        self.file = true;
        self
    }

    /// Policy node types are accepted under any parent.
    pub fn allows_child(&self, child_type: &str) -> bool {
        if PolicyKind::from_node_type(child_type).is_some() {
            return true;
        }
        match &self.allowed_child_types {
            None => true,
            Some(allowed) => allowed.contains(child_type),
        }
    }

    pub fn is_mandatory_child(&self, name: &str) -> bool {
        self.mandatory_children.iter().any(|c| c == name)
    }
}

/// Registry of node types plus the globally protected property names.
#[derive(Debug, Clone)]
pub struct NodeTypeRegistry {
    types: HashMap<String, NodeTypeDefinition>,
    protected_properties: BTreeSet<String>,
}

impl Default for NodeTypeRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl NodeTypeRegistry {
    pub fn empty() -> Self {
        NodeTypeRegistry {
            types: HashMap::new(),
            protected_properties: BTreeSet::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let hierarchy = ["nt:folder", "nt:file", "sling:Folder", "sling:OrderedFolder"];
        let mut registry = Self::empty();
        registry.register(NodeTypeDefinition::new("rep:root"));
        registry.register(
            NodeTypeDefinition::new(UNSTRUCTURED_TYPE).with_default_child_type(UNSTRUCTURED_TYPE),
        );
        registry.register(
            NodeTypeDefinition::new(FOLDER_TYPE)
                .with_default_child_type(FOLDER_TYPE)
                .with_allowed_child_types(hierarchy)
                .folder(),
        );
        registry.register(
            NodeTypeDefinition::new("sling:Folder")
                .with_default_child_type("sling:Folder")
                .folder(),
        );
        registry.register(
            NodeTypeDefinition::new("sling:OrderedFolder")
                .with_default_child_type("sling:OrderedFolder")
                .folder(),
        );
        registry.register(
            NodeTypeDefinition::new("nt:file")
                .with_default_child_type("nt:resource")
                .with_allowed_child_types(["nt:resource", "nt:unstructured"])
                .with_mandatory_child("jcr:content")
                .file(),
        );
        registry.register(
            NodeTypeDefinition::new("nt:resource").with_allowed_child_types(Vec::<String>::new()),
        );
        for kind in PolicyKind::ALL {
            registry.register(NodeTypeDefinition::new(kind.node_type()));
        }
        for name in [
            "jcr:uuid",
            "jcr:primaryType",
            "jcr:mixinTypes",
            "jcr:created",
            "jcr:createdBy",
            "jcr:baseVersion",
            "jcr:predecessors",
            "jcr:versionHistory",
            "jcr:isCheckedOut",
        ] {
            registry.protect(name);
        }
        registry
    }

    pub fn register(&mut self, definition: NodeTypeDefinition) {
        self.types.insert(definition.name.clone(), definition);
    }

    pub fn protect(&mut self, property: impl Into<String>) {
        self.protected_properties.insert(property.into());
    }

    pub fn get(&self, name: &str) -> Option<&NodeTypeDefinition> {
        self.types.get(name)
    }

    pub fn is_folder_type(&self, name: &str) -> bool {
        self.get(name).map(|d| d.folder).unwrap_or(false)
    }

    pub fn is_file_type(&self, name: &str) -> bool {
        self.get(name).map(|d| d.file).unwrap_or(false)
    }

    /// Unknown parent types accept any child.
    pub fn allows_child(&self, parent_type: &str, child_type: &str) -> bool {
        self.get(parent_type)
            .map(|d| d.allows_child(child_type))
            .unwrap_or(true)
    }

    pub fn is_protected(&self, property: &str) -> bool {
        self.protected_properties.contains(property)
    }
}
