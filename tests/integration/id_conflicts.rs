//! Identifier conflict policies

use super::test_utils::{children, exists, import, node, path, paths, try_import};
use contentpkg::error::ImportError;
use contentpkg::tree::{MemoryRepository, Repository};
use contentpkg::{FilterSet, IdConflictPolicy, ImportMode, ImportOptions, WorkspaceFilter};
use std::collections::BTreeSet;

const ID: &str = "5f0c2d1e-0000-4000-8000-000000000001";

/// `/content/old` holds the identifier, followed by a sibling `/content/other`.
fn repo_with_holder(holder: &str) -> MemoryRepository {
    let mut repo = MemoryRepository::new();
    let holder = path(holder);
    if let Some(parent) = holder.parent() {
        repo.ensure_path(&parent, "nt:unstructured").unwrap();
    }
    repo.create(&holder, "nt:unstructured", &BTreeSet::new(), Some(ID))
        .unwrap();
    repo.ensure_path(&path("/content/other"), "nt:unstructured")
        .unwrap();
    repo.commit().unwrap();
    repo
}

fn options(policy: IdConflictPolicy) -> ImportOptions {
    ImportOptions::default()
        .with_mode(ImportMode::Merge)
        .with_id_conflict_policy(policy)
}

fn identifier_at(repo: &MemoryRepository, raw: &str) -> Option<String> {
    repo.find(&path(raw)).unwrap().and_then(|n| n.identifier)
}

#[test]
fn test_fail_records_error_and_skips_node() {
    let mut repo = repo_with_holder("/content/old");
    let report = import(
        &mut repo,
        options(IdConflictPolicy::Fail),
        vec![node("/content"), node("/content/new").with_identifier(ID)],
    );
    assert!(report.has_errors());
    assert_eq!(report.errors[0].path, "/content/new");
    assert_eq!(report.errors[0].kind, "referential_integrity");
    assert!(!exists(&repo, "/content/new"));
    assert_eq!(identifier_at(&repo, "/content/old").as_deref(), Some(ID));
}

#[test]
fn test_fail_aborts_strict_run() {
    let mut repo = repo_with_holder("/content/old");
    let err = try_import(
        &mut repo,
        options(IdConflictPolicy::Fail).strict(true),
        vec![node("/content"), node("/content/new").with_identifier(ID)],
    )
    .unwrap_err();
    assert!(matches!(err, ImportError::ReferentialIntegrity { .. }));
}

#[test]
fn test_create_new_id_keeps_holder() {
    let mut repo = repo_with_holder("/content/old");
    import(
        &mut repo,
        options(IdConflictPolicy::CreateNewId),
        vec![node("/content"), node("/content/new").with_identifier(ID)],
    );
    let assigned = identifier_at(&repo, "/content/new").unwrap();
    assert_ne!(assigned, ID);
    assert_eq!(identifier_at(&repo, "/content/old").as_deref(), Some(ID));
}

#[test]
fn test_force_remove_takes_identifier() {
    let mut repo = repo_with_holder("/content/old");
    let report = import(
        &mut repo,
        options(IdConflictPolicy::ForceRemoveConflictingId),
        vec![node("/content"), node("/content/new").with_identifier(ID)],
    );
    assert_eq!(paths(&report.removed), vec!["/content/old"]);
    assert!(!exists(&repo, "/content/old"));
    assert_eq!(identifier_at(&repo, "/content/new").as_deref(), Some(ID));
    assert_eq!(
        repo.find_by_identifier(ID).unwrap(),
        Some(path("/content/new"))
    );
}

#[test]
fn test_force_remove_refuses_ancestor_holder() {
    let mut repo = repo_with_holder("/content/old");
    let report = import(
        &mut repo,
        options(IdConflictPolicy::ForceRemoveConflictingId),
        vec![
            node("/content"),
            node("/content/old"),
            node("/content/old/child").with_identifier(ID),
        ],
    );
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].kind, "referential_integrity");
    assert!(exists(&repo, "/content/old"));
    assert!(!exists(&repo, "/content/old/child"));
}

#[test]
fn test_legacy_sibling_takes_over_slot() {
    let mut repo = repo_with_holder("/content/old");
    import(
        &mut repo,
        options(IdConflictPolicy::Legacy),
        vec![node("/content"), node("/content/new").with_identifier(ID)],
    );
    assert_eq!(children(&repo, "/content"), vec!["new", "other"]);
    assert_eq!(identifier_at(&repo, "/content/new").as_deref(), Some(ID));
}

#[test]
fn test_legacy_elsewhere_gets_fresh_identifier() {
    let mut repo = repo_with_holder("/etc/old");
    import(
        &mut repo,
        options(IdConflictPolicy::Legacy),
        vec![node("/content"), node("/content/new").with_identifier(ID)],
    );
    assert!(exists(&repo, "/etc/old"));
    assert_eq!(identifier_at(&repo, "/etc/old").as_deref(), Some(ID));
    let assigned = identifier_at(&repo, "/content/new").unwrap();
    assert_ne!(assigned, ID);
}

#[test]
fn test_fail_creates_no_intermediates() {
    let mut repo = MemoryRepository::new();
    repo.create(&path("/old"), "nt:unstructured", &BTreeSet::new(), Some(ID))
        .unwrap();
    repo.commit().unwrap();
    let filter = WorkspaceFilter::new()
        .with_set(FilterSet::parse("/content/site/en").unwrap())
        .unwrap();

    let report = import(
        &mut repo,
        options(IdConflictPolicy::Fail).with_filter(filter),
        vec![
            node("/content"),
            node("/content/site"),
            node("/content/site/en").with_identifier(ID),
        ],
    );
    assert!(report.has_errors());
    assert!(report.added.is_empty());
    assert_eq!(paths(&repo.paths()), vec!["/", "/old"]);
}

/// `/content/new` exists with its own identifier; the archive gives it the one
/// `/content/old` holds.
fn repo_with_existing_target() -> MemoryRepository {
    let mut repo = repo_with_holder("/content/old");
    repo.create(
        &path("/content/new"),
        "nt:unstructured",
        &BTreeSet::new(),
        Some("own-id"),
    )
    .unwrap();
    repo.commit().unwrap();
    repo
}

#[test]
fn test_fail_checked_for_existing_nodes_in_every_mode() {
    for mode in [
        ImportMode::Update,
        ImportMode::Merge,
        ImportMode::UpdateProperties,
        ImportMode::MergeProperties,
    ] {
        let mut repo = repo_with_existing_target();
        let err = try_import(
            &mut repo,
            options(IdConflictPolicy::Fail).with_mode(mode).strict(true),
            vec![
                node("/content"),
                node("/content/new")
                    .with_identifier(ID)
                    .with_property("title", "New"),
            ],
        )
        .unwrap_err();
        assert!(
            matches!(err, ImportError::ReferentialIntegrity { path: ref at, .. } if at.as_str() == "/content/new"),
            "{mode}: {err}"
        );
        assert_eq!(identifier_at(&repo, "/content/new").as_deref(), Some("own-id"));
    }
}

#[test]
fn test_force_remove_applies_to_existing_node() {
    let mut repo = repo_with_existing_target();
    let report = import(
        &mut repo,
        options(IdConflictPolicy::ForceRemoveConflictingId).with_mode(ImportMode::Update),
        vec![node("/content"), node("/content/new").with_identifier(ID)],
    );
    assert!(!report.has_errors());
    assert_eq!(paths(&report.removed), vec!["/content/old"]);
    assert!(exists(&repo, "/content/new"));
}
