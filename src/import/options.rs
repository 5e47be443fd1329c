//! Import options and the policy enums they carry

use crate::config::ImportSettings;
use crate::filter::WorkspaceFilter;
use crate::import::listener::{ListenerMode, ProgressListener, TracingListener};
use crate::tree::PolicyKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

macro_rules! policy_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        /// Accepts `snake_case`, `SCREAMING_SNAKE_CASE` and `kebab-case`.
        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == normalized)
                    .ok_or_else(|| format!("unknown {} '{}'", stringify!($name), s))
            }
        }
    };
}

policy_enum! {
    /// How incoming content reconciles with existing content under a root.
    ImportMode {
        #[default]
        Replace => "replace",
        Update => "update",
        Merge => "merge",
        UpdateProperties => "update_properties",
        MergeProperties => "merge_properties",
    }
}

impl ImportMode {
    /// Existing child structure is never altered.
    pub fn is_properties_only(&self) -> bool {
        matches!(self, ImportMode::UpdateProperties | ImportMode::MergeProperties)
    }

    /// Existing properties are never overwritten.
    pub fn is_merge(&self) -> bool {
        matches!(self, ImportMode::Merge | ImportMode::MergeProperties)
    }
}

policy_enum! {
    /// Resolution when an incoming identifier is held by another node.
    IdConflictPolicy {
        #[default]
        Fail => "fail",
        CreateNewId => "create_new_id",
        ForceRemoveConflictingId => "force_remove_conflicting_id",
        Legacy => "legacy",
    }
}

policy_enum! {
    AccessControlHandling {
        #[default]
        Ignore => "ignore",
        Overwrite => "overwrite",
        Merge => "merge",
        MergePreserve => "merge_preserve",
    }
}

policy_enum! {
    DependencyHandling {
        #[default]
        Ignore => "ignore",
        Strict => "strict",
        Required => "required",
        BestEffort => "best_effort",
    }
}

/// Options for one import run.
#[derive(Clone)]
pub struct ImportOptions {
    /// Overrides the package filter when set.
    pub filter: Option<WorkspaceFilter>,
    pub default_import_mode: ImportMode,
    pub id_conflict_policy: IdConflictPolicy,
    pub access_control_handling: AccessControlHandling,
    /// Falls back to `access_control_handling` when unset.
    pub cug_handling: Option<AccessControlHandling>,
    pub dependency_handling: DependencyHandling,
    /// Nodes per commit; `<= 0` commits once at the end.
    pub auto_save_threshold: i64,
    pub strict: bool,
    pub overwrite_primary_types_of_folders: bool,
    pub listener: Arc<dyn ProgressListener>,
    pub listener_mode: ListenerMode,
}

impl Default for ImportOptions {
    fn default() -> Self {
        ImportOptions {
            filter: None,
            default_import_mode: ImportMode::Replace,
            id_conflict_policy: IdConflictPolicy::Fail,
            access_control_handling: AccessControlHandling::Ignore,
            cug_handling: None,
            dependency_handling: DependencyHandling::Ignore,
            auto_save_threshold: 0,
            strict: false,
            overwrite_primary_types_of_folders: true,
            listener: Arc::new(TracingListener),
            listener_mode: ListenerMode::Paths,
        }
    }
}

impl fmt::Debug for ImportOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportOptions")
            .field("filter", &self.filter)
            .field("default_import_mode", &self.default_import_mode)
            .field("id_conflict_policy", &self.id_conflict_policy)
            .field("access_control_handling", &self.access_control_handling)
            .field("cug_handling", &self.cug_handling)
            .field("dependency_handling", &self.dependency_handling)
            .field("auto_save_threshold", &self.auto_save_threshold)
            .field("strict", &self.strict)
            .field(
                "overwrite_primary_types_of_folders",
                &self.overwrite_primary_types_of_folders,
            )
            .field("listener_mode", &self.listener_mode)
            .finish_non_exhaustive()
    }
}

impl ImportOptions {
    pub fn from_settings(settings: &ImportSettings) -> Self {
        ImportOptions {
            default_import_mode: settings.mode,
            id_conflict_policy: settings.id_conflict,
            access_control_handling: settings.access_control,
            cug_handling: settings.cug,
            dependency_handling: settings.dependencies,
            auto_save_threshold: settings.auto_save_threshold,
            strict: settings.strict,
            overwrite_primary_types_of_folders: settings.overwrite_primary_types_of_folders,
            ..Self::default()
        }
    }

    pub fn with_filter(mut self, filter: WorkspaceFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_mode(mut self, mode: ImportMode) -> Self {
        self.default_import_mode = mode;
        self
    }

    pub fn with_id_conflict_policy(mut self, policy: IdConflictPolicy) -> Self {
        self.id_conflict_policy = policy;
        self
    }

    pub fn with_access_control(mut self, handling: AccessControlHandling) -> Self {
        self.access_control_handling = handling;
        self
    }

    pub fn with_cug_handling(mut self, handling: AccessControlHandling) -> Self {
        self.cug_handling = Some(handling);
        self
    }

    pub fn with_dependency_handling(mut self, handling: DependencyHandling) -> Self {
        self.dependency_handling = handling;
        self
    }

    pub fn with_auto_save_threshold(mut self, threshold: i64) -> Self {
        self.auto_save_threshold = threshold;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_overwrite_primary_types_of_folders(mut self, overwrite: bool) -> Self {
        self.overwrite_primary_types_of_folders = overwrite;
        self
    }

    pub fn with_listener(mut self, listener: Arc<dyn ProgressListener>) -> Self {
        self.listener = listener;
        self
    }

    pub fn with_listener_mode(mut self, mode: ListenerMode) -> Self {
        self.listener_mode = mode;
        self
    }

    pub fn effective_cug_handling(&self) -> AccessControlHandling {
        self.cug_handling.unwrap_or(self.access_control_handling)
    }

    /// Handling that applies to a policy of the given kind.
    pub fn handling_for(&self, kind: PolicyKind) -> AccessControlHandling {
        match kind {
            PolicyKind::Cug => self.effective_cug_handling(),
            PolicyKind::Acl | PolicyKind::PrincipalAcl => self.access_control_handling,
        }
    }

    /// Batch size when auto-save is enabled.
    pub fn batch_size(&self) -> Option<usize> {
        if self.auto_save_threshold > 0 {
            Some(self.auto_save_threshold as usize)
        } else {
            None
        }
    }
}
