//! Progress listener contract and the provided listeners

use crate::error::ImportError;
use crate::tree::NodePath;
use parking_lot::Mutex;
use tracing::{info, warn};

/// Whether messages describe individual paths or free-form progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerMode {
    Textual,
    Paths,
}

/// Action reported for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Added,
    Updated,
    Deleted,
    Error,
}

impl Action {
    pub fn code(&self) -> char {
        match self {
            Action::Added => 'A',
            Action::Updated => 'U',
            Action::Deleted => 'D',
            Action::Error => 'E',
        }
    }
}

/// Synchronous callback contract invoked by the importer.
pub trait ProgressListener: Send + Sync {
    fn on_message(&self, mode: ListenerMode, action: Action, path: &NodePath);

    fn on_error(&self, mode: ListenerMode, path: &NodePath, error: &ImportError);
}

/// Forwards every event to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingListener;

impl ProgressListener for TracingListener {
    fn on_message(&self, _mode: ListenerMode, action: Action, path: &NodePath) {
        info!(action = %action.code(), path = %path, "Import progress");
    }

    fn on_error(&self, _mode: ListenerMode, path: &NodePath, error: &ImportError) {
        warn!(path = %path, error = %error, "Import error");
    }
}

/// A recorded listener event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerEvent {
    Message {
        mode: ListenerMode,
        action: Action,
        path: NodePath,
    },
    Error {
        mode: ListenerMode,
        path: NodePath,
        message: String,
    },
}

/// Records events in memory.
#[derive(Debug, Default)]
pub struct CollectingListener {
    events: Mutex<Vec<ListenerEvent>>,
}

impl CollectingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ListenerEvent> {
        self.events.lock().clone()
    }

    /// `(code, path)` pairs in emission order, errors included as `E`.
    pub fn codes(&self) -> Vec<(char, String)> {
        self.events
            .lock()
            .iter()
            .map(|event| match event {
                ListenerEvent::Message { action, path, .. } => (action.code(), path.to_string()),
                ListenerEvent::Error { path, .. } => (Action::Error.code(), path.to_string()),
            })
            .collect()
    }

    pub fn error_paths(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                ListenerEvent::Error { path, .. } => Some(path.to_string()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl ProgressListener for CollectingListener {
    fn on_message(&self, mode: ListenerMode, action: Action, path: &NodePath) {
        self.events.lock().push(ListenerEvent::Message {
            mode,
            action,
            path: path.clone(),
        });
    }

    fn on_error(&self, mode: ListenerMode, path: &NodePath, error: &ImportError) {
        self.events.lock().push(ListenerEvent::Error {
            mode,
            path: path.clone(),
            message: error.to_string(),
        });
    }
}
