//! Merge Engine
//!
//! Walks a pre-ordered descriptor stream, resolves the import mode for each
//! path from the workspace filter, and issues mutations to the repository.
//! Subtree-level work (removing unrepresented children under REPLACE and
//! reordering) happens when the traversal leaves a node.

use crate::archive::Archive;
use crate::error::{ArchiveError, ImportError};
use crate::filter::WorkspaceFilter;
use crate::import::kind::{ContentKind, HANDLERS};
use crate::import::listener::Action;
use crate::import::options::{AccessControlHandling, ImportMode, ImportOptions};
use crate::import::report::{ImportReport, PathFailure};
use crate::tree::{ContentDescriptor, NodePath, PolicyKind, Repository};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, error, info, instrument, warn};

/// Imports descriptor streams into a repository.
#[derive(Debug, Clone)]
pub struct Importer {
    options: ImportOptions,
    filter: WorkspaceFilter,
}

impl Importer {
    /// Uses the options' filter, or a filter covering everything.
    pub fn new(options: ImportOptions) -> Self {
        let filter = options
            .filter
            .clone()
            .unwrap_or_else(WorkspaceFilter::covering_all);
        Importer { options, filter }
    }

    /// Uses the options' filter override, else the package filter. An empty
    /// package filter covers everything.
    pub fn for_package(options: ImportOptions, package_filter: &WorkspaceFilter) -> Self {
        let filter = match &options.filter {
            Some(filter) => filter.clone(),
            None if package_filter.is_empty() => WorkspaceFilter::covering_all(),
            None => package_filter.clone(),
        };
        Importer { options, filter }
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    pub fn filter(&self) -> &WorkspaceFilter {
        &self.filter
    }

    /// Merge a path-ordered descriptor stream into `repo`.
    ///
    /// Strict runs return the first fatal error; committed batches stay in
    /// place. Non-strict runs record errors in the report and continue.
    #[instrument(skip_all, fields(strict = self.options.strict))]
    pub fn run<I>(&self, entries: I, repo: &mut dyn Repository) -> Result<ImportReport, ImportError>
    where
        I: IntoIterator<Item = Result<ContentDescriptor, ArchiveError>>,
    {
        info!(
            mode = %self.options.default_import_mode,
            roots = self.filter.sets().len(),
            "Starting import"
        );
        let mut session = Session::new(repo, &self.options, &self.filter);
        for entry in entries {
            match entry {
                Ok(descriptor) => session.visit(&descriptor)?,
                Err(err) => session.archive_failure(err)?,
            }
        }
        let report = session.finish()?;
        info!(summary = %report.summary(), "Import finished");
        Ok(report)
    }

    /// Open `archive`, import its entries, and close it on every exit path.
    #[instrument(skip_all)]
    pub fn run_archive(
        &self,
        archive: &mut dyn Archive,
        repo: &mut dyn Repository,
    ) -> Result<ImportReport, ImportError> {
        archive.open(self.options.strict)?;
        let guard = OpenArchive { archive };
        let entries = guard.archive.entries()?;
        self.run(entries, repo)
    }
}

struct OpenArchive<'a> {
    archive: &'a mut dyn Archive,
}

impl Drop for OpenArchive<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.archive.close() {
            warn!(error = %e, "Failed to close archive");
        }
    }
}

/// Per-node traversal state kept until the traversal leaves the node.
#[derive(Debug)]
pub(super) struct Frame {
    pub path: NodePath,
    /// The node was imported; passthrough frames only collect names.
    pub active: bool,
    pub replace: bool,
    pub reorder: bool,
    pub represented: BTreeSet<String>,
    pub child_order: Option<Vec<String>>,
    /// Type and mixins an uncovered ancestor is described with, used if the
    /// node has to be created for a covered descendant.
    pub described: Option<(String, BTreeSet<String>)>,
}

impl Frame {
    fn passthrough(descriptor: &ContentDescriptor) -> Self {
        Frame {
            path: descriptor.path.clone(),
            active: false,
            replace: false,
            reorder: false,
            represented: BTreeSet::new(),
            child_order: None,
            described: Some((
                descriptor.primary_type.clone(),
                descriptor.mixin_types.clone(),
            )),
        }
    }

    pub fn imported(descriptor: &ContentDescriptor, mode: ImportMode) -> Self {
        Frame {
            path: descriptor.path.clone(),
            active: true,
            replace: mode == ImportMode::Replace,
            reorder: matches!(mode, ImportMode::Replace | ImportMode::Update),
            represented: descriptor
                .child_order
                .iter()
                .flatten()
                .cloned()
                .collect(),
            child_order: descriptor.child_order.clone(),
            described: None,
        }
    }
}

/// What the traversal does after a node handler returns.
#[derive(Debug)]
pub(super) struct Outcome {
    pub frame: Option<Frame>,
    pub skip_subtree: bool,
}

impl Outcome {
    pub fn descend(frame: Frame) -> Self {
        Outcome {
            frame: Some(frame),
            skip_subtree: false,
        }
    }

    pub fn skip() -> Self {
        Outcome {
            frame: None,
            skip_subtree: true,
        }
    }
}

/// State of one run against one repository.
pub(super) struct Session<'r> {
    pub repo: &'r mut dyn Repository,
    pub options: &'r ImportOptions,
    pub filter: &'r WorkspaceFilter,
    pub report: ImportReport,
    /// Nodes created during this run.
    pub created: HashSet<NodePath>,
    frames: Vec<Frame>,
    skip_under: Option<NodePath>,
    identifiers: HashMap<String, Option<NodePath>>,
    dirty: bool,
    pending: usize,
}

impl<'r> Session<'r> {
    fn new(
        repo: &'r mut dyn Repository,
        options: &'r ImportOptions,
        filter: &'r WorkspaceFilter,
    ) -> Self {
        Session {
            repo,
            options,
            filter,
            report: ImportReport::default(),
            created: HashSet::new(),
            frames: Vec::new(),
            skip_under: None,
            identifiers: HashMap::new(),
            dirty: false,
            pending: 0,
        }
    }

    fn visit(&mut self, descriptor: &ContentDescriptor) -> Result<(), ImportError> {
        let path = &descriptor.path;
        if let Some(skip) = &self.skip_under {
            if skip.is_ancestor_or_self(path) {
                return Ok(());
            }
            self.skip_under = None;
        }

        self.close_frames_outside(path)?;
        self.mark_represented(path);

        if self.filter.skips_subtree(path) {
            debug!(path = %path, "Outside filter, skipping subtree");
            self.skip_under = Some(path.clone());
            return Ok(());
        }
        if !self.filter.covers(path) {
            self.frames.push(Frame::passthrough(descriptor));
            return Ok(());
        }

        let mode = self
            .filter
            .mode_for_or(path, self.options.default_import_mode)
            .unwrap_or(self.options.default_import_mode);
        match self.import_node(descriptor, mode) {
            Ok(outcome) => {
                if let Some(frame) = outcome.frame {
                    self.frames.push(frame);
                }
                if outcome.skip_subtree {
                    self.skip_under = Some(path.clone());
                }
            }
            Err(err) => self.fail(path, err)?,
        }
        self.flush_if_due()
    }

    fn import_node(
        &mut self,
        descriptor: &ContentDescriptor,
        mode: ImportMode,
    ) -> Result<Outcome, ImportError> {
        let existing = self.repo.find(&descriptor.path)?;
        let kind = ContentKind::classify(descriptor, existing.as_ref(), &*self.repo);
        debug!(path = %descriptor.path, ?kind, %mode, exists = existing.is_some(), "Importing node");
        let handler = HANDLERS[kind as usize];
        handler(self, descriptor, existing, mode)
    }

    /// Type and mixins the archive gave `path` while traversing it uncovered.
    pub fn described(&self, path: &NodePath) -> Option<(String, BTreeSet<String>)> {
        self.frames
            .iter()
            .find(|f| f.path == *path)
            .and_then(|f| f.described.clone())
    }

    /// Record `path` as represented in every open ancestor frame.
    fn mark_represented(&mut self, path: &NodePath) {
        for frame in &mut self.frames {
            if !frame.path.is_ancestor_of(path) {
                continue;
            }
            if let Some(name) = path.segments().nth(frame.path.depth()) {
                frame.represented.insert(name.to_string());
            }
        }
    }

    fn close_frames_outside(&mut self, path: &NodePath) -> Result<(), ImportError> {
        while self
            .frames
            .last()
            .map(|f| !f.path.is_ancestor_of(path))
            .unwrap_or(false)
        {
            if let Some(frame) = self.frames.pop() {
                self.close_frame(frame)?;
            }
        }
        Ok(())
    }

    fn close_frame(&mut self, frame: Frame) -> Result<(), ImportError> {
        let path = frame.path.clone();
        if let Err(err) = self.finalize(frame) {
            self.record(&path, err, false)?;
        }
        self.flush_if_due()
    }

    /// Remove unrepresented covered children under REPLACE, then apply the
    /// archive's child order.
    fn finalize(&mut self, frame: Frame) -> Result<(), ImportError> {
        if !frame.active {
            return Ok(());
        }
        let Some(live) = self.repo.find(&frame.path)? else {
            return Ok(());
        };

        if frame.replace {
            let node_type = self.repo.node_type(&live.primary_type).cloned();
            for name in &live.children {
                if frame.represented.contains(name) {
                    continue;
                }
                if node_type
                    .as_ref()
                    .map(|d| d.is_mandatory_child(name))
                    .unwrap_or(false)
                {
                    continue;
                }
                let child = frame.path.join(name);
                let removable = match PolicyKind::from_node_name(name) {
                    Some(kind) => {
                        self.options.handling_for(kind) == AccessControlHandling::Overwrite
                    }
                    None => self.filter.covers(&child),
                };
                if removable {
                    self.remove_node(&child)?;
                }
            }
        }

        if frame.reorder {
            if let Some(order) = &frame.child_order {
                if let Some(live) = self.repo.find(&frame.path)? {
                    let mut expected: Vec<String> = order
                        .iter()
                        .filter(|name| live.has_child(name))
                        .cloned()
                        .collect();
                    expected.extend(
                        live.children
                            .iter()
                            .filter(|c| !order.contains(*c))
                            .cloned(),
                    );
                    if expected != live.children {
                        self.repo.reorder_children(&frame.path, order)?;
                        self.mark_dirty();
                    }
                }
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Result<ImportReport, ImportError> {
        while let Some(frame) = self.frames.pop() {
            self.close_frame(frame)?;
        }
        self.flush_if_due()?;
        self.commit()?;
        Ok(self.report)
    }

    fn archive_failure(&mut self, err: ArchiveError) -> Result<(), ImportError> {
        let err = ImportError::from(err);
        let path = err
            .path()
            .and_then(|p| NodePath::parse(p).ok())
            .unwrap_or_else(NodePath::root);
        self.fail(&path, err)
    }

    /// Strict: abort. Otherwise record the error and skip the subtree.
    fn fail(&mut self, path: &NodePath, err: ImportError) -> Result<(), ImportError> {
        self.record(path, err, true)
    }

    fn record(&mut self, path: &NodePath, err: ImportError, skip: bool) -> Result<(), ImportError> {
        self.options
            .listener
            .on_error(self.options.listener_mode, path, &err);
        if self.options.strict {
            error!(path = %path, error = %err, "Import aborted");
            return Err(err);
        }
        warn!(path = %path, error = %err, "Import error, continuing");
        self.report.errors.push(PathFailure::new(path, &err));
        if skip {
            self.skip_under = Some(path.clone());
        }
        Ok(())
    }

    fn flush_if_due(&mut self) -> Result<(), ImportError> {
        if !self.dirty {
            return Ok(());
        }
        self.dirty = false;
        self.pending += 1;
        if let Some(batch) = self.options.batch_size() {
            if self.pending >= batch {
                self.commit()?;
            }
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<(), ImportError> {
        match self.repo.commit() {
            Ok(()) => {
                self.report.commits += 1;
                debug!(nodes = self.pending, commits = self.report.commits, "Committed batch");
                self.pending = 0;
                Ok(())
            }
            Err(err) => self.record(&NodePath::root(), err.into(), false),
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn added(&mut self, path: &NodePath) {
        self.mark_dirty();
        self.report.added.push(path.clone());
        self.options
            .listener
            .on_message(self.options.listener_mode, Action::Added, path);
    }

    pub fn updated(&mut self, path: &NodePath) {
        self.mark_dirty();
        self.report.updated.push(path.clone());
        self.options
            .listener
            .on_message(self.options.listener_mode, Action::Updated, path);
    }

    pub fn remove_node(&mut self, path: &NodePath) -> Result<(), ImportError> {
        self.repo.remove(path)?;
        self.invalidate_identifiers();
        self.mark_dirty();
        self.report.removed.push(path.clone());
        self.options
            .listener
            .on_message(self.options.listener_mode, Action::Deleted, path);
        Ok(())
    }

    pub fn skip_protected(&mut self, path: &NodePath, property: &str) -> bool {
        if !self.repo.is_protected_property(property) {
            return false;
        }
        let diagnostic = ImportError::ProtectedAttributeSkipped {
            path: path.to_string(),
            property: property.to_string(),
        };
        warn!(path = %path, property, "Skipping protected property");
        self.report
            .diagnostics
            .push(PathFailure::new(path, &diagnostic));
        true
    }

    /// Identifier lookup cached for the run.
    pub fn lookup_identifier(&mut self, identifier: &str) -> Result<Option<NodePath>, ImportError> {
        if let Some(cached) = self.identifiers.get(identifier) {
            return Ok(cached.clone());
        }
        let found = self.repo.find_by_identifier(identifier)?;
        self.identifiers
            .insert(identifier.to_string(), found.clone());
        Ok(found)
    }

    pub fn remember_identifier(&mut self, identifier: &str, path: &NodePath) {
        self.identifiers
            .insert(identifier.to_string(), Some(path.clone()));
    }

    pub fn invalidate_identifiers(&mut self) {
        self.identifiers.clear();
    }
}
