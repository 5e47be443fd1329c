//! Merge Engine (Importer)
//!
//! Reconciles an incoming descriptor stream with a live tree under the import
//! modes, identifier-conflict policies and access-control handlings.

pub mod access_control;
mod apply;
pub mod engine;
pub mod kind;
pub mod listener;
pub mod options;
pub mod report;

pub use access_control::merge_policy;
pub use engine::Importer;
pub use kind::ContentKind;
pub use listener::{Action, CollectingListener, ListenerEvent, ListenerMode, ProgressListener, TracingListener};
pub use options::{
    AccessControlHandling, DependencyHandling, IdConflictPolicy, ImportMode, ImportOptions,
};
pub use report::{ImportReport, PathFailure};
