//! Directory archive
//!
//! One directory per node. A node directory may hold a `.content.json`
//! descriptor; a directory without one is an `nt:folder`. Plain files become
//! `nt:file` nodes with a `jcr:content` resource child. Namespaced names are
//! stored as `_prefix_local` (`jcr:content` -> `_jcr_content`), and a literal
//! leading underscore is doubled.

use crate::archive::{in_sub_archive, Archive, ArchiveProvider, Entries};
use crate::error::ArchiveError;
use crate::package::PackageId;
use crate::tree::{
    AccessControlList, ContentDescriptor, NodePath, PropertyValue, Repository,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Descriptor file name inside a node directory.
pub const DESCRIPTOR_FILE: &str = ".content.json";

const FILE_TYPE: &str = "nt:file";
const RESOURCE_TYPE: &str = "nt:resource";
const FOLDER_TYPE: &str = "nt:folder";
const CONTENT_NODE: &str = "jcr:content";
const DATA_PROPERTY: &str = "jcr:data";

/// On-disk shape of a descriptor; the path comes from the directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct NodeFile {
    primary_type: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    mixin_types: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    properties: BTreeMap<String, PropertyValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    child_order: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    policy: Option<AccessControlList>,
}

impl NodeFile {
    fn into_descriptor(self, path: NodePath) -> ContentDescriptor {
        ContentDescriptor {
            path,
            primary_type: self.primary_type,
            mixin_types: self.mixin_types,
            properties: self.properties,
            identifier: self.identifier,
            child_order: self.child_order,
            policy: self.policy,
        }
    }
}

/// Encode a node name as a file name.
pub fn encode_name(name: &str) -> String {
    match name.split_once(':') {
        Some((prefix, local)) => format!("_{}_{}", prefix, local),
        None if name.starts_with('_') => format!("_{}", name),
        None => name.to_string(),
    }
}

/// Decode a file name back into a node name.
pub fn decode_name(file_name: &str) -> String {
    if let Some(rest) = file_name.strip_prefix("__") {
        return format!("_{}", rest);
    }
    if let Some(rest) = file_name.strip_prefix('_') {
        if let Some((prefix, local)) = rest.split_once('_') {
            if !prefix.is_empty() && !local.is_empty() {
                return format!("{}:{}", prefix, local);
            }
        }
    }
    file_name.to_string()
}

/// Archive reading a directory tree, mounted at a repository path.
#[derive(Debug, Clone)]
pub struct DirectoryArchive {
    root: PathBuf,
    mount: NodePath,
    subpath: Option<(NodePath, bool)>,
    open: bool,
}

impl DirectoryArchive {
    /// Archive whose top directory maps to the repository root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::mounted(root, NodePath::root())
    }

    /// Archive whose top directory maps to `mount`.
    pub fn mounted(root: impl Into<PathBuf>, mount: NodePath) -> Self {
        DirectoryArchive {
            root: root.into(),
            mount,
            subpath: None,
            open: false,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn node_path(&self, fs_path: &Path) -> Result<NodePath, ArchiveError> {
        let relative = fs_path.strip_prefix(&self.root).map_err(|_| ArchiveError::Parse {
            path: fs_path.display().to_string(),
            message: "entry outside archive root".to_string(),
        })?;
        let mut path = self.mount.clone();
        for component in relative.components() {
            let name = component.as_os_str().to_string_lossy();
            path = path.join(&decode_name(&name));
        }
        Ok(path)
    }

    fn read_node(&self, dir: &Path, path: NodePath) -> Result<Option<ContentDescriptor>, ArchiveError> {
        let descriptor_file = dir.join(DESCRIPTOR_FILE);
        if !descriptor_file.is_file() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&descriptor_file)?;
        let node: NodeFile = serde_json::from_str(&raw).map_err(|e| ArchiveError::Parse {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Ok(Some(node.into_descriptor(path)))
    }

    fn read_file(fs_path: &Path, path: NodePath) -> Result<Vec<ContentDescriptor>, ArchiveError> {
        let data = std::fs::read(fs_path)?;
        let content = ContentDescriptor::new(path.join(CONTENT_NODE), RESOURCE_TYPE)
            .with_property(DATA_PROPERTY, String::from_utf8_lossy(&data).into_owned());
        Ok(vec![ContentDescriptor::new(path, FILE_TYPE), content])
    }

    fn descriptors_for(&self, entry: &walkdir::DirEntry) -> Result<Vec<ContentDescriptor>, ArchiveError> {
        let path = self.node_path(entry.path())?;
        if entry.file_type().is_dir() {
            return match self.read_node(entry.path(), path.clone())? {
                Some(descriptor) => Ok(vec![descriptor]),
                None if entry.depth() == 0 => Ok(Vec::new()),
                None => Ok(vec![ContentDescriptor::new(path, FOLDER_TYPE)]),
            };
        }
        Self::read_file(entry.path(), path)
    }

    fn selected(&self, descriptor: &ContentDescriptor) -> bool {
        match &self.subpath {
            Some((subpath, recursive)) => in_sub_archive(&descriptor.path, subpath, *recursive),
            None => true,
        }
    }

    fn walk(&self) -> impl Iterator<Item = Result<ContentDescriptor, ArchiveError>> + '_ {
        WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
            .flat_map(move |entry| {
                let result = entry
                    .map_err(|e| ArchiveError::IoError(e.into()))
                    .and_then(|entry| self.descriptors_for(&entry));
                match result {
                    Ok(descriptors) => descriptors.into_iter().map(Ok).collect::<Vec<_>>(),
                    Err(err) => vec![Err(err)],
                }
            })
            .filter(move |item| match item {
                Ok(descriptor) => self.selected(descriptor),
                Err(_) => true,
            })
    }
}

impl Archive for DirectoryArchive {
    fn open(&mut self, strict: bool) -> Result<(), ArchiveError> {
        if !self.root.is_dir() {
            return Err(ArchiveError::NotFound(self.root.display().to_string()));
        }
        self.root = dunce::canonicalize(&self.root)?;
        if strict {
            for item in self.walk() {
                item?;
            }
        }
        debug!(root = %self.root.display(), mount = %self.mount, "Opened directory archive");
        self.open = true;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn entries(&self) -> Result<Entries<'_>, ArchiveError> {
        if !self.open {
            return Err(ArchiveError::NotOpen);
        }
        Ok(Box::new(self.walk()))
    }

    fn sub_archive(
        &self,
        subpath: &NodePath,
        recursive: bool,
    ) -> Result<Box<dyn Archive>, ArchiveError> {
        Ok(Box::new(DirectoryArchive {
            root: self.root.clone(),
            mount: self.mount.clone(),
            subpath: Some((subpath.clone(), recursive)),
            open: false,
        }))
    }

    fn close(&mut self) -> Result<(), ArchiveError> {
        self.open = false;
        Ok(())
    }
}

/// Package archives stored as `<dir>/<group>/<name>/<version>/`.
#[derive(Debug, Clone)]
pub struct DirectoryProvider {
    dir: PathBuf,
}

impl DirectoryProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirectoryProvider { dir: dir.into() }
    }

    pub fn package_dir(&self, id: &PackageId) -> PathBuf {
        let version = if id.version().is_empty() {
            "_unversioned"
        } else {
            id.version().as_str()
        };
        self.dir.join(id.group()).join(id.name()).join(version)
    }
}

impl ArchiveProvider for DirectoryProvider {
    fn open_archive(&self, id: &PackageId) -> Result<Box<dyn Archive>, ArchiveError> {
        let dir = self.package_dir(id);
        if !dir.is_dir() {
            return Err(ArchiveError::NotFound(id.to_string()));
        }
        Ok(Box::new(DirectoryArchive::new(dir)))
    }
}

/// Write the live subtree at `root` into `target` in directory-archive
/// layout, mounted at the repository root. Returns the number of nodes written.
pub fn export_subtree(
    repo: &dyn Repository,
    root: &NodePath,
    target: &Path,
) -> Result<usize, ArchiveError> {
    let mut written = 0;
    let mut pending = vec![root.clone()];
    while let Some(path) = pending.pop() {
        let node = repo
            .find(&path)
            .map_err(|e| ArchiveError::Parse {
                path: path.to_string(),
                message: e.to_string(),
            })?
            .ok_or_else(|| ArchiveError::NotFound(path.to_string()))?;

        let mut dir = target.to_path_buf();
        for segment in path.segments() {
            dir.push(encode_name(segment));
        }
        std::fs::create_dir_all(&dir)?;

        let node_file = NodeFile {
            primary_type: node.primary_type.clone(),
            mixin_types: node.mixin_types.clone(),
            properties: node.properties.clone(),
            identifier: node.identifier.clone(),
            child_order: (node.children.len() > 1).then(|| node.children.clone()),
            policy: node.policy.clone(),
        };
        let json = serde_json::to_string_pretty(&node_file).map_err(|e| ArchiveError::Parse {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        std::fs::write(dir.join(DESCRIPTOR_FILE), json)?;
        written += 1;

        for child in node.children.iter().rev() {
            pending.push(path.join(child));
        }
    }
    Ok(written)
}
