//! Auto-save batching, commit failures and progress events

use super::test_utils::{exists, import, node, path, try_import};
use contentpkg::error::{ImportError, RepositoryError};
use contentpkg::import::CollectingListener;
use contentpkg::tree::{ContentDescriptor, MemoryRepository};
use contentpkg::{ImportMode, ImportOptions};
use std::sync::Arc;

fn four_nodes() -> Vec<ContentDescriptor> {
    vec![
        node("/content"),
        node("/content/a"),
        node("/content/b"),
        node("/content/c"),
    ]
}

#[test]
fn test_threshold_one_commits_per_node() {
    let mut repo = MemoryRepository::new();
    let report = import(
        &mut repo,
        ImportOptions::default().with_auto_save_threshold(1),
        four_nodes(),
    );
    assert!(report.commits >= 5);
    assert_eq!(report.commits, repo.commit_count());
}

#[test]
fn test_threshold_two_batches_pairs() {
    let mut repo = MemoryRepository::new();
    let report = import(
        &mut repo,
        ImportOptions::default().with_auto_save_threshold(2),
        four_nodes(),
    );
    assert_eq!(report.commits, 3);
}

#[test]
fn test_unset_threshold_commits_once() {
    let mut repo = MemoryRepository::new();
    let report = import(&mut repo, ImportOptions::default(), four_nodes());
    assert_eq!(report.commits, 1);
    assert!(!repo.has_pending_changes());
}

#[test]
fn test_failed_commit_keeps_earlier_batches() {
    let mut repo = MemoryRepository::new();
    repo.fail_commit_at(2);
    let err = try_import(
        &mut repo,
        ImportOptions::default()
            .with_auto_save_threshold(1)
            .strict(true),
        four_nodes(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ImportError::Repository(RepositoryError::CommitFailed(_))
    ));

    repo.revert();
    assert!(exists(&repo, "/content"));
    assert!(!exists(&repo, "/content/a"));
}

#[test]
fn test_listener_receives_path_events() {
    let mut repo = MemoryRepository::new();
    repo.ensure_path(&path("/content/stale"), "nt:unstructured")
        .unwrap();
    let listener = Arc::new(CollectingListener::new());

    import(
        &mut repo,
        ImportOptions::default()
            .with_mode(ImportMode::Replace)
            .with_listener(listener.clone()),
        vec![node("/content").with_property("title", "T"), node("/content/a")],
    );

    assert_eq!(
        listener.codes(),
        vec![
            ('U', "/content".to_string()),
            ('A', "/content/a".to_string()),
            ('D', "/content/stale".to_string()),
        ]
    );
}
