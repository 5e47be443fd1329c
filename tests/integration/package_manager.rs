//! Install and uninstall through directory-backed packages

use super::test_utils::{exists, path};
use contentpkg::archive::DirectoryProvider;
use contentpkg::dependency::{PackageRegistry, SledRegistry};
use contentpkg::tree::{MemoryRepository, PropertyValue, Repository};
use contentpkg::{DependencyHandling, ImportOptions, PackageId, PackageManager, PackageMetadata};
use std::path::Path;
use tempfile::TempDir;

fn id(raw: &str) -> PackageId {
    raw.parse().unwrap()
}

fn write_node(dir: &Path, json: &str) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join(".content.json"), json).unwrap();
}

struct Fixture {
    _temp: TempDir,
    registry: SledRegistry,
    provider: DirectoryProvider,
}

/// `acme:core:1.0` owns `/libs/core`, `acme:app:1.0` owns `/apps/app` and
/// depends on core.
fn fixture() -> Fixture {
    let temp = TempDir::new().unwrap();
    let packages = temp.path().join("packages");

    let core = packages.join("acme/core/1.0");
    write_node(&core.join("libs/core"), r#"{"primary_type":"sling:Folder"}"#);
    write_node(
        &core.join("libs/core/config"),
        r#"{"primary_type":"nt:unstructured","properties":{"enabled":true}}"#,
    );

    let app = packages.join("acme/app/1.0");
    write_node(&app.join("apps/app"), r#"{"primary_type":"sling:Folder"}"#);
    std::fs::write(app.join("apps/app/page.html"), "<h1>hello</h1>").unwrap();

    let registry = SledRegistry::new(temp.path().join("registry")).unwrap();
    registry
        .register(
            PackageMetadata::from_toml_str(
                r#"
id = "acme:core:1.0"

[[filter.sets]]
root = "/libs/core"
"#,
            )
            .unwrap(),
        )
        .unwrap();
    registry
        .register(
            PackageMetadata::from_toml_str(
                r#"
id = "acme:app:1.0"
dependencies = ["acme:core:1.0"]

[[filter.sets]]
root = "/apps/app"
"#,
            )
            .unwrap(),
        )
        .unwrap();

    Fixture {
        _temp: temp,
        registry,
        provider: DirectoryProvider::new(packages),
    }
}

#[test]
fn test_install_with_dependencies() {
    let fx = fixture();
    let mut repo = MemoryRepository::new();
    let manager = PackageManager::new(&fx.registry, &fx.provider);

    let options = ImportOptions::default().with_dependency_handling(DependencyHandling::Required);
    let result = manager.install(&id("acme:app:1.0"), &mut repo, &options).unwrap();

    assert!(!result.has_errors());
    let installed: Vec<&PackageId> = result.installed().collect();
    assert_eq!(installed, vec![&id("acme:core:1.0"), &id("acme:app:1.0")]);
    assert!(fx.registry.is_installed(&id("acme:core:1.0")).unwrap());

    let config = repo.find(&path("/libs/core/config")).unwrap().unwrap();
    assert_eq!(config.property("enabled"), Some(&PropertyValue::Boolean(true)));
    let page = repo
        .find(&path("/apps/app/page.html/jcr:content"))
        .unwrap()
        .unwrap();
    assert_eq!(page.property("jcr:data").and_then(|v| v.as_str()), Some("<h1>hello</h1>"));
}

#[test]
fn test_ignore_installs_only_the_requested_package() {
    let fx = fixture();
    let mut repo = MemoryRepository::new();
    let manager = PackageManager::new(&fx.registry, &fx.provider);

    let result = manager
        .install(&id("acme:app:1.0"), &mut repo, &ImportOptions::default())
        .unwrap();
    assert_eq!(result.reports.len(), 1);
    assert!(exists(&repo, "/apps/app"));
    assert!(!exists(&repo, "/libs/core"));
    assert!(!fx.registry.is_installed(&id("acme:core:1.0")).unwrap());
}

#[test]
fn test_uninstall_dependents_first() {
    let fx = fixture();
    let mut repo = MemoryRepository::new();
    let manager = PackageManager::new(&fx.registry, &fx.provider);
    let options = ImportOptions::default().with_dependency_handling(DependencyHandling::Required);
    manager.install(&id("acme:app:1.0"), &mut repo, &options).unwrap();

    let result = manager
        .uninstall(&id("acme:core:1.0"), &mut repo, &options)
        .unwrap();
    assert_eq!(
        result.plan.order,
        vec![id("acme:app:1.0"), id("acme:core:1.0")]
    );
    assert!(!exists(&repo, "/apps/app"));
    assert!(!exists(&repo, "/libs/core"));
    assert!(exists(&repo, "/libs"));
    assert!(fx.registry.installed().unwrap().is_empty());
}

#[test]
fn test_missing_archive_is_an_error() {
    let fx = fixture();
    fx.registry
        .register(PackageMetadata::new(id("acme:ghost:1.0")))
        .unwrap();
    let mut repo = MemoryRepository::new();
    let manager = PackageManager::new(&fx.registry, &fx.provider);
    assert!(manager
        .install(&id("acme:ghost:1.0"), &mut repo, &ImportOptions::default())
        .is_err());
    assert!(!fx.registry.is_installed(&id("acme:ghost:1.0")).unwrap());
}
