//! Workspace filter scoping during import

use super::test_utils::{exists, import, node, path, paths};
use contentpkg::tree::MemoryRepository;
use contentpkg::{FilterSet, ImportMode, ImportOptions, WorkspaceFilter};

fn site_filter() -> WorkspaceFilter {
    WorkspaceFilter::new()
        .with_set(
            FilterSet::parse("/content/site")
                .unwrap()
                .exclude("/content/site/user(/.*)?")
                .unwrap(),
        )
        .unwrap()
}

#[test]
fn test_import_touches_only_covered_content() {
    let mut repo = MemoryRepository::new();
    for p in ["/content/site/old", "/content/site/user/data", "/etc/config"] {
        repo.ensure_path(&path(p), "nt:unstructured").unwrap();
    }

    let report = import(
        &mut repo,
        ImportOptions::default().with_filter(site_filter()),
        vec![
            node("/content"),
            node("/content/site"),
            node("/content/site/en"),
            node("/content/site/user"),
            node("/content/site/user/a"),
            node("/etc"),
            node("/etc/other"),
        ],
    );

    assert_eq!(paths(&report.added), vec!["/content/site/en"]);
    assert_eq!(paths(&report.removed), vec!["/content/site/old"]);
    assert!(!report.has_errors());

    assert!(exists(&repo, "/content/site/en"));
    assert!(exists(&repo, "/content/site/user/data"));
    assert!(!exists(&repo, "/content/site/user/a"));
    assert!(exists(&repo, "/etc/config"));
    assert!(!exists(&repo, "/etc/other"));
}

#[test]
fn test_nested_root_mode_applies_to_its_subtree() {
    let filter = WorkspaceFilter::new()
        .with_set(FilterSet::parse("/content").unwrap())
        .unwrap()
        .with_set(
            FilterSet::parse("/content/shared")
                .unwrap()
                .with_mode(ImportMode::Merge),
        )
        .unwrap();
    let mut repo = MemoryRepository::new();
    repo.ensure_path(&path("/content/page/local"), "nt:unstructured")
        .unwrap();
    repo.ensure_path(&path("/content/shared/local"), "nt:unstructured")
        .unwrap();

    let report = import(
        &mut repo,
        ImportOptions::default().with_filter(filter),
        vec![
            node("/content"),
            node("/content/page"),
            node("/content/shared"),
            node("/content/shared/incoming"),
        ],
    );

    // REPLACE under /content/page drops the unrepresented child, MERGE under
    // /content/shared keeps it.
    assert_eq!(paths(&report.removed), vec!["/content/page/local"]);
    assert!(exists(&repo, "/content/shared/local"));
    assert!(exists(&repo, "/content/shared/incoming"));
}

#[test]
fn test_filter_definition_from_toml() {
    let filter = WorkspaceFilter::from_toml_str(
        r#"
[[sets]]
root = "/apps/site"
rules = [{ exclude = "/apps/site/install(/.*)?" }]

[[sets]]
root = "/apps/site/config"
mode = "update"
"#,
    )
    .unwrap();

    assert!(filter.covers(&path("/apps/site/components")));
    assert!(!filter.covers(&path("/apps/site/install/bundle.jar")));
    assert_eq!(
        filter.mode_for(&path("/apps/site/config/a")),
        Some(ImportMode::Update)
    );
    assert_eq!(
        filter.mode_for(&path("/apps/site/components")),
        Some(ImportMode::Replace)
    );
    assert!(filter.skips_subtree(&path("/libs")));
    assert!(!filter.skips_subtree(&path("/apps")));
}

#[test]
fn test_overlapping_roots_are_rejected() {
    let result = WorkspaceFilter::new()
        .with_set(FilterSet::parse("/content/site").unwrap())
        .unwrap()
        .with_set(FilterSet::parse("/content").unwrap());
    assert!(result.is_err());
}
