//! Archives driven end to end through the importer

use super::test_utils::{node, path, property};
use contentpkg::archive::{export_subtree, Archive, DirectoryArchive, MemoryArchive};
use contentpkg::error::ImportError;
use contentpkg::tree::{ContentDescriptor, MemoryRepository, Repository};
use contentpkg::{ImportOptions, Importer};
use tempfile::TempDir;

#[test]
fn test_export_then_import_into_fresh_repository() {
    let mut source = MemoryRepository::new();
    let mut archive = MemoryArchive::new(vec![
        node("/content"),
        node("/content/site")
            .with_property("title", "Site")
            .with_identifier("site-id")
            .with_child_order(["fr", "en"]),
        node("/content/site/en"),
        node("/content/site/fr"),
    ]);
    Importer::new(ImportOptions::default())
        .run_archive(&mut archive, &mut source)
        .unwrap();

    let target = TempDir::new().unwrap();
    let written = export_subtree(&source, &path("/content"), target.path()).unwrap();
    assert_eq!(written, 4);

    let mut copy = MemoryRepository::new();
    let mut exported = DirectoryArchive::new(target.path());
    let report = Importer::new(ImportOptions::default())
        .run_archive(&mut exported, &mut copy)
        .unwrap();
    assert!(!report.has_errors());

    assert_eq!(property(&copy, "/content/site", "title").as_deref(), Some("Site"));
    assert_eq!(
        copy.find_by_identifier("site-id").unwrap(),
        Some(path("/content/site"))
    );
    let site = copy.find(&path("/content/site")).unwrap().unwrap();
    assert_eq!(site.children, vec!["fr", "en"]);
}

#[test]
fn test_archive_closed_after_strict_failure() {
    let mut repo = MemoryRepository::new();
    let mut archive = MemoryArchive::new(vec![
        ContentDescriptor::new(path("/content"), "nt:folder"),
        node("/content/x"),
    ]);
    let err = Importer::new(ImportOptions::default().strict(true))
        .run_archive(&mut archive, &mut repo)
        .unwrap_err();
    assert!(matches!(err, ImportError::ConstraintViolation { .. }));
    assert_eq!(archive.close_count(), 1);
    assert!(!archive.is_open());
}
