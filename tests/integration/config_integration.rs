//! Layered configuration feeding import runs

use contentpkg::cli::{ImportOverrides, RunContext};
use contentpkg::config::ConfigLoader;
use contentpkg::error::PackageError;
use contentpkg::{AccessControlHandling, DependencyHandling, IdConflictPolicy, ImportMode};
use std::sync::Mutex;
use tempfile::TempDir;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

const CONFIG: &str = r#"
[import]
mode = "update"
id_conflict = "legacy"
access_control = "merge"
dependencies = "best_effort"
auto_save_threshold = 25

[storage]
snapshot_path = "state/repo.json"
"#;

#[test]
fn test_config_file_seeds_import_options() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("contentpkg.toml");
    std::fs::write(&config_path, CONFIG).unwrap();

    let context = RunContext::new(temp.path().to_path_buf(), Some(config_path)).unwrap();
    let options = context.import_options(&ImportOverrides::default());
    assert_eq!(options.default_import_mode, ImportMode::Update);
    assert_eq!(options.id_conflict_policy, IdConflictPolicy::Legacy);
    assert_eq!(options.access_control_handling, AccessControlHandling::Merge);
    assert_eq!(options.effective_cug_handling(), AccessControlHandling::Merge);
    assert_eq!(options.dependency_handling, DependencyHandling::BestEffort);
    assert_eq!(options.batch_size(), Some(25));
}

#[test]
fn test_environment_overrides_file() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("contentpkg.toml");
    std::fs::write(&config_path, CONFIG).unwrap();

    std::env::set_var("CONTENTPKG__IMPORT__MODE", "merge_properties");
    let loaded = ConfigLoader::load_from_file(&config_path);
    std::env::remove_var("CONTENTPKG__IMPORT__MODE");

    let config = loaded.unwrap();
    assert_eq!(config.import.mode, ImportMode::MergeProperties);
    assert_eq!(config.import.id_conflict, IdConflictPolicy::Legacy);
}

#[test]
fn test_invalid_threshold_rejected() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("contentpkg.toml");
    std::fs::write(&config_path, "[import]\nauto_save_threshold = -5\n").unwrap();

    let err = RunContext::new(temp.path().to_path_buf(), Some(config_path)).unwrap_err();
    match err {
        PackageError::ConfigError(message) => assert!(message.contains("auto_save_threshold")),
        other => panic!("unexpected error: {other}"),
    }
}
