//! Access control handling during import

use super::test_utils::{exists, import, node, path, paths};
use contentpkg::tree::{
    AccessControlEntry, AccessControlList, ContentDescriptor, MemoryRepository, PolicyKind,
    Repository,
};
use contentpkg::{AccessControlHandling, ImportOptions};

fn e1() -> AccessControlEntry {
    AccessControlEntry::allow("everyone").with_privilege("jcr:read")
}

fn e2() -> AccessControlEntry {
    AccessControlEntry::deny("anonymous").with_privilege("jcr:read")
}

fn acl(kind: PolicyKind, entries: Vec<AccessControlEntry>) -> AccessControlList {
    AccessControlList { kind, entries }
}

fn repo_with_policy(kind: PolicyKind, entries: Vec<AccessControlEntry>) -> MemoryRepository {
    let mut repo = MemoryRepository::new();
    repo.ensure_path(&path("/content/site"), "nt:unstructured")
        .unwrap();
    repo.write_policy(
        &path("/content/site").join(kind.node_name()),
        &acl(kind, entries),
    )
    .unwrap();
    repo.commit().unwrap();
    repo
}

fn policy_entries(repo: &MemoryRepository, raw: &str) -> Option<Vec<AccessControlEntry>> {
    repo.find(&path(raw))
        .unwrap()
        .and_then(|n| n.policy)
        .map(|p| p.entries)
}

fn with_policy(kind: PolicyKind, entries: Vec<AccessControlEntry>) -> Vec<ContentDescriptor> {
    vec![
        node("/content"),
        node("/content/site"),
        ContentDescriptor::for_policy(&path("/content/site"), acl(kind, entries)),
    ]
}

#[test]
fn test_merge_appends_new_entry() {
    let mut repo = repo_with_policy(PolicyKind::Acl, vec![e1()]);
    let report = import(
        &mut repo,
        ImportOptions::default().with_access_control(AccessControlHandling::Merge),
        with_policy(PolicyKind::Acl, vec![e2()]),
    );
    assert_eq!(
        policy_entries(&repo, "/content/site/rep:policy"),
        Some(vec![e1(), e2()])
    );
    assert_eq!(paths(&report.updated), vec!["/content/site/rep:policy"]);
}

#[test]
fn test_merge_of_identical_entry_is_a_no_op() {
    let mut repo = repo_with_policy(PolicyKind::Acl, vec![e1()]);
    let report = import(
        &mut repo,
        ImportOptions::default().with_access_control(AccessControlHandling::Merge),
        with_policy(PolicyKind::Acl, vec![e1()]),
    );
    assert_eq!(
        policy_entries(&repo, "/content/site/rep:policy"),
        Some(vec![e1()])
    );
    assert!(report.updated.is_empty());
}

#[test]
fn test_ignore_keeps_live_policy_and_creates_none() {
    let mut repo = repo_with_policy(PolicyKind::Acl, vec![e1()]);
    import(
        &mut repo,
        ImportOptions::default(),
        with_policy(PolicyKind::Acl, vec![e2()]),
    );
    assert_eq!(
        policy_entries(&repo, "/content/site/rep:policy"),
        Some(vec![e1()])
    );

    let mut empty = MemoryRepository::new();
    import(
        &mut empty,
        ImportOptions::default(),
        with_policy(PolicyKind::Acl, vec![e2()]),
    );
    assert!(exists(&empty, "/content/site"));
    assert!(!exists(&empty, "/content/site/rep:policy"));
}

#[test]
fn test_overwrite_removes_policy_missing_from_archive() {
    let mut repo = repo_with_policy(PolicyKind::Acl, vec![e1()]);
    let report = import(
        &mut repo,
        ImportOptions::default().with_access_control(AccessControlHandling::Overwrite),
        vec![node("/content"), node("/content/site")],
    );
    assert!(!exists(&repo, "/content/site/rep:policy"));
    assert_eq!(paths(&report.removed), vec!["/content/site/rep:policy"]);

    let mut kept = repo_with_policy(PolicyKind::Acl, vec![e1()]);
    import(
        &mut kept,
        ImportOptions::default(),
        vec![node("/content"), node("/content/site")],
    );
    assert!(exists(&kept, "/content/site/rep:policy"));
}

#[test]
fn test_cug_handling_is_independent() {
    let mut repo = repo_with_policy(PolicyKind::Cug, vec![e1()]);
    import(
        &mut repo,
        ImportOptions::default()
            .with_access_control(AccessControlHandling::Ignore)
            .with_cug_handling(AccessControlHandling::Overwrite),
        with_policy(PolicyKind::Cug, vec![e2()]),
    );
    assert_eq!(
        policy_entries(&repo, "/content/site/rep:cugPolicy"),
        Some(vec![e2()])
    );
}
