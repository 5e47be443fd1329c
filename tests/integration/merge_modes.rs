//! Import mode semantics against pre-existing content

use super::test_utils::{children, exists, import, node, path, paths, property};
use contentpkg::tree::{ContentDescriptor, MemoryRepository, PropertyValue, Repository};
use contentpkg::{FilterSet, ImportMode, ImportOptions, WorkspaceFilter};

/// `/content/a` with `title = Old`, `keep = yes` and a child `x`.
fn existing_repo() -> MemoryRepository {
    let mut repo = MemoryRepository::new();
    repo.ensure_path(&path("/content/a/x"), "nt:unstructured")
        .unwrap();
    repo.set_property(&path("/content/a"), "title", &PropertyValue::from("Old"))
        .unwrap();
    repo.set_property(&path("/content/a"), "keep", &PropertyValue::from("yes"))
        .unwrap();
    repo.commit().unwrap();
    repo
}

fn incoming() -> Vec<ContentDescriptor> {
    vec![
        node("/content"),
        node("/content/a")
            .with_property("title", "New")
            .with_property("desc", "D"),
        node("/content/a/y"),
    ]
}

fn run_mode(mode: ImportMode) -> (MemoryRepository, contentpkg::ImportReport) {
    let mut repo = existing_repo();
    let report = import(&mut repo, ImportOptions::default().with_mode(mode), incoming());
    (repo, report)
}

#[test]
fn test_replace_mirrors_archive() {
    let (repo, report) = run_mode(ImportMode::Replace);
    assert_eq!(property(&repo, "/content/a", "title").as_deref(), Some("New"));
    assert_eq!(property(&repo, "/content/a", "keep"), None);
    assert!(!exists(&repo, "/content/a/x"));
    assert!(exists(&repo, "/content/a/y"));
    assert_eq!(paths(&report.removed), vec!["/content/a/x"]);
}

#[test]
fn test_replace_is_idempotent() {
    let (mut repo, _) = run_mode(ImportMode::Replace);
    let before = repo.paths();
    let second = import(&mut repo, ImportOptions::default(), incoming());
    assert!(second.added.is_empty());
    assert!(second.updated.is_empty());
    assert!(second.removed.is_empty());
    assert_eq!(repo.paths(), before);
}

#[test]
fn test_update_overwrites_without_removing() {
    let (repo, report) = run_mode(ImportMode::Update);
    assert_eq!(property(&repo, "/content/a", "title").as_deref(), Some("New"));
    assert_eq!(property(&repo, "/content/a", "keep").as_deref(), Some("yes"));
    assert!(exists(&repo, "/content/a/x"));
    assert!(exists(&repo, "/content/a/y"));
    assert!(report.removed.is_empty());
}

#[test]
fn test_merge_is_non_destructive() {
    let (repo, report) = run_mode(ImportMode::Merge);
    assert_eq!(property(&repo, "/content/a", "title").as_deref(), Some("Old"));
    assert_eq!(property(&repo, "/content/a", "desc").as_deref(), Some("D"));
    assert_eq!(property(&repo, "/content/a", "keep").as_deref(), Some("yes"));
    assert!(exists(&repo, "/content/a/x"));
    assert!(exists(&repo, "/content/a/y"));
    assert!(report.removed.is_empty());
    assert_eq!(paths(&report.updated), vec!["/content/a"]);
}

#[test]
fn test_update_properties_leaves_structure() {
    let (repo, report) = run_mode(ImportMode::UpdateProperties);
    assert_eq!(property(&repo, "/content/a", "title").as_deref(), Some("New"));
    assert!(exists(&repo, "/content/a/x"));
    assert!(!exists(&repo, "/content/a/y"));
    assert!(report.added.is_empty());
}

#[test]
fn test_merge_properties_only_adds_missing_properties() {
    let (repo, _) = run_mode(ImportMode::MergeProperties);
    assert_eq!(property(&repo, "/content/a", "title").as_deref(), Some("Old"));
    assert_eq!(property(&repo, "/content/a", "desc").as_deref(), Some("D"));
    assert!(!exists(&repo, "/content/a/y"));
}

#[test]
fn test_properties_only_modes_create_new_roots() {
    let mut repo = MemoryRepository::new();
    repo.ensure_path(&path("/content"), "nt:unstructured").unwrap();
    let filter = WorkspaceFilter::new()
        .with_set(FilterSet::parse("/content/a").unwrap())
        .unwrap();

    let report = import(
        &mut repo,
        ImportOptions::default()
            .with_mode(ImportMode::MergeProperties)
            .with_filter(filter),
        incoming(),
    );
    assert_eq!(paths(&report.added), vec!["/content/a", "/content/a/y"]);
}

#[test]
fn test_folder_type_kept_when_overwrite_disabled() {
    let mut repo = MemoryRepository::new();
    repo.ensure_path(&path("/content/f"), "sling:Folder").unwrap();

    import(
        &mut repo,
        ImportOptions::default().with_overwrite_primary_types_of_folders(false),
        vec![node("/content"), node("/content/f")],
    );
    let live = repo.find(&path("/content/f")).unwrap().unwrap();
    assert_eq!(live.primary_type, "sling:Folder");

    import(
        &mut repo,
        ImportOptions::default(),
        vec![node("/content"), node("/content/f")],
    );
    let live = repo.find(&path("/content/f")).unwrap().unwrap();
    assert_eq!(live.primary_type, "nt:unstructured");
}

#[test]
fn test_existing_file_untouched_by_merge() {
    let mut repo = MemoryRepository::new();
    repo.ensure_path(&path("/content/file.txt"), "nt:file").unwrap();
    repo.ensure_path(&path("/content/file.txt/jcr:content"), "nt:resource")
        .unwrap();
    repo.set_property(
        &path("/content/file.txt/jcr:content"),
        "jcr:data",
        &PropertyValue::from("old"),
    )
    .unwrap();

    let report = import(
        &mut repo,
        ImportOptions::default().with_mode(ImportMode::Merge),
        vec![
            node("/content"),
            ContentDescriptor::new(path("/content/file.txt"), "nt:file"),
            ContentDescriptor::new(path("/content/file.txt/jcr:content"), "nt:resource")
                .with_property("jcr:data", "new"),
        ],
    );
    assert!(report.updated.is_empty());
    assert_eq!(
        property(&repo, "/content/file.txt/jcr:content", "jcr:data").as_deref(),
        Some("old")
    );
}

#[test]
fn test_protected_property_is_a_diagnostic() {
    let mut repo = MemoryRepository::new();
    let report = import(
        &mut repo,
        ImportOptions::default(),
        vec![node("/content").with_property("jcr:uuid", "abc")],
    );
    assert!(!report.has_errors());
    assert_eq!(report.diagnostics.len(), 1);
    assert!(exists(&repo, "/content"));
    assert_eq!(property(&repo, "/content", "jcr:uuid"), None);
}

#[test]
fn test_replace_applies_child_order() {
    let mut repo = MemoryRepository::new();
    for name in ["c", "b", "a"] {
        repo.ensure_path(&path(&format!("/content/list/{}", name)), "nt:unstructured")
            .unwrap();
    }
    import(
        &mut repo,
        ImportOptions::default(),
        vec![
            node("/content"),
            node("/content/list").with_child_order(["a", "b", "c"]),
            node("/content/list/a"),
            node("/content/list/b"),
            node("/content/list/c"),
        ],
    );
    assert_eq!(children(&repo, "/content/list"), vec!["a", "b", "c"]);
}

fn primary_type(repo: &MemoryRepository, raw: &str) -> String {
    repo.find(&path(raw)).unwrap().unwrap().primary_type
}

fn stash_paths(repo: &MemoryRepository) -> Vec<String> {
    repo.paths()
        .iter()
        .filter(|p| p.as_str().starts_with("/.contentpkg-stash"))
        .map(|p| p.to_string())
        .collect()
}

#[test]
fn test_replace_into_file_keeps_mandatory_content() {
    let mut repo = MemoryRepository::new();
    repo.ensure_path(&path("/content/doc/jcr:content"), "nt:resource")
        .unwrap();
    repo.set_property(
        &path("/content/doc/jcr:content"),
        "jcr:data",
        &PropertyValue::from("body"),
    )
    .unwrap();
    repo.commit().unwrap();

    let report = import(
        &mut repo,
        ImportOptions::default(),
        vec![
            node("/content"),
            ContentDescriptor::new(path("/content/doc"), "nt:file"),
        ],
    );
    assert!(!report.has_errors());
    assert_eq!(paths(&report.updated), vec!["/content/doc"]);
    assert_eq!(primary_type(&repo, "/content/doc"), "nt:file");
    assert_eq!(children(&repo, "/content/doc"), vec!["jcr:content"]);
    assert_eq!(
        property(&repo, "/content/doc/jcr:content", "jcr:data").as_deref(),
        Some("body")
    );
    assert!(stash_paths(&repo).is_empty());
}

#[test]
fn test_rejected_replace_leaves_node_in_place() {
    let mut repo = MemoryRepository::new();
    repo.ensure_path(&path("/apps"), "nt:folder").unwrap();
    for p in ["/apps/f", "/apps/f/keep"] {
        repo.create(&path(p), "nt:folder", &Default::default(), None)
            .unwrap();
    }
    repo.commit().unwrap();
    let filter = WorkspaceFilter::new()
        .with_set(
            FilterSet::parse("/apps/f")
                .unwrap()
                .exclude("/apps/f/keep")
                .unwrap(),
        )
        .unwrap();

    let report = import(
        &mut repo,
        ImportOptions::default().with_filter(filter),
        vec![node("/apps/f")],
    );
    assert!(report.has_errors());
    assert_eq!(report.errors[0].path, "/apps/f");
    assert_eq!(report.errors[0].kind, "constraint_violation");
    assert_eq!(primary_type(&repo, "/apps/f"), "nt:folder");
    assert!(exists(&repo, "/apps/f/keep"));
    assert!(stash_paths(&repo).is_empty());
}

#[test]
fn test_intermediate_takes_parent_default_type() {
    let mut repo = MemoryRepository::new();
    repo.ensure_path(&path("/apps"), "nt:folder").unwrap();

    let report = import(
        &mut repo,
        ImportOptions::default(),
        vec![ContentDescriptor::new(path("/apps/tools/lib"), "sling:Folder")],
    );
    assert!(!report.has_errors());
    assert_eq!(paths(&report.added), vec!["/apps/tools", "/apps/tools/lib"]);
    assert_eq!(primary_type(&repo, "/apps/tools"), "nt:folder");
}

#[test]
fn test_intermediate_fits_the_node_below() {
    let mut repo = MemoryRepository::new();
    let report = import(
        &mut repo,
        ImportOptions::default(),
        vec![node("/content/x/y")],
    );
    assert!(!report.has_errors());
    assert_eq!(primary_type(&repo, "/content"), "nt:unstructured");
    assert_eq!(primary_type(&repo, "/content/x"), "nt:unstructured");
    assert!(exists(&repo, "/content/x/y"));
}

#[test]
fn test_nested_root_creates_described_ancestors() {
    let mut repo = MemoryRepository::new();
    let filter = WorkspaceFilter::new()
        .with_set(FilterSet::parse("/content/site").unwrap())
        .unwrap();

    let report = import(
        &mut repo,
        ImportOptions::default().with_filter(filter),
        vec![
            node("/content").with_mixin("mix:title"),
            node("/content/site"),
            node("/content/site/en"),
        ],
    );
    assert!(!report.has_errors(), "{:?}", report.errors);
    assert_eq!(
        paths(&report.added),
        vec!["/content", "/content/site", "/content/site/en"]
    );
    let content = repo.find(&path("/content")).unwrap().unwrap();
    assert_eq!(content.primary_type, "nt:unstructured");
    assert!(content.mixin_types.contains("mix:title"));
}
