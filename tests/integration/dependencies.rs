//! Dependency resolution against the sled-backed registry

use chrono::Utc;
use contentpkg::dependency::{DependencyResolver, PackageRegistry, SledRegistry};
use contentpkg::error::DependencyError;
use contentpkg::{DependencyHandling, PackageId, PackageMetadata};
use tempfile::TempDir;

fn id(raw: &str) -> PackageId {
    raw.parse().unwrap()
}

fn package(raw: &str, deps: &[&str]) -> PackageMetadata {
    deps.iter().fold(PackageMetadata::new(id(raw)), |meta, dep| {
        meta.with_dependency(dep.parse().unwrap())
    })
}

fn registry(temp: &TempDir) -> SledRegistry {
    SledRegistry::new(temp.path().join("registry")).unwrap()
}

/// A depends on B, B depends on C.
fn chain(registry: &SledRegistry) {
    registry
        .register(package("acme:a:1.0", &["acme:b"]))
        .unwrap();
    registry
        .register(package("acme:b:1.0", &["acme:c"]))
        .unwrap();
    registry.register(package("acme:c:1.0", &[])).unwrap();
}

#[test]
fn test_required_orders_dependencies_first() {
    let temp = TempDir::new().unwrap();
    let registry = registry(&temp);
    chain(&registry);

    let plan = DependencyResolver::new(&registry)
        .resolve_install_order(&id("acme:a:1.0"), DependencyHandling::Required)
        .unwrap();
    assert_eq!(
        plan.order,
        vec![id("acme:c:1.0"), id("acme:b:1.0"), id("acme:a:1.0")]
    );
    assert!(plan.is_clean());
}

#[test]
fn test_installed_dependencies_are_not_rescheduled() {
    let temp = TempDir::new().unwrap();
    let registry = registry(&temp);
    chain(&registry);
    registry
        .mark_installed(&id("acme:b:1.0"), Utc::now())
        .unwrap();

    let plan = DependencyResolver::new(&registry)
        .resolve_install_order(&id("acme:a:1.0"), DependencyHandling::Required)
        .unwrap();
    assert_eq!(plan.order, vec![id("acme:a:1.0")]);
}

#[test]
fn test_strict_requires_installed_dependencies() {
    let temp = TempDir::new().unwrap();
    let registry = registry(&temp);
    chain(&registry);

    let err = DependencyResolver::new(&registry)
        .resolve_install_order(&id("acme:a:1.0"), DependencyHandling::Strict)
        .unwrap_err();
    assert!(matches!(err, DependencyError::Unresolved { .. }));

    registry
        .mark_installed(&id("acme:b:1.0"), Utc::now())
        .unwrap();
    let plan = DependencyResolver::new(&registry)
        .resolve_install_order(&id("acme:a:1.0"), DependencyHandling::Strict)
        .unwrap();
    assert_eq!(plan.order, vec![id("acme:a:1.0")]);
}

#[test]
fn test_cycle_fails_required_and_breaks_under_best_effort() {
    let temp = TempDir::new().unwrap();
    let registry = registry(&temp);
    registry
        .register(package("acme:d:1.0", &["acme:e"]))
        .unwrap();
    registry
        .register(package("acme:e:1.0", &["acme:d"]))
        .unwrap();
    let resolver = DependencyResolver::new(&registry);

    let err = resolver
        .resolve_install_order(&id("acme:d:1.0"), DependencyHandling::Required)
        .unwrap_err();
    match err {
        DependencyError::Cyclic { cycle } => {
            assert_eq!(cycle.first(), cycle.last());
            assert!(cycle.contains(&id("acme:e:1.0")));
        }
        other => panic!("expected cycle, got {other}"),
    }

    let plan = resolver
        .resolve_install_order(&id("acme:d:1.0"), DependencyHandling::BestEffort)
        .unwrap();
    assert_eq!(plan.order, vec![id("acme:e:1.0"), id("acme:d:1.0")]);
    assert_eq!(plan.cycles.len(), 1);
}

#[test]
fn test_best_effort_reports_missing_dependency() {
    let temp = TempDir::new().unwrap();
    let registry = registry(&temp);
    registry
        .register(package("acme:app:1.0", &["acme:missing"]))
        .unwrap();

    let plan = DependencyResolver::new(&registry)
        .resolve_install_order(&id("acme:app:1.0"), DependencyHandling::BestEffort)
        .unwrap();
    assert_eq!(plan.order, vec![id("acme:app:1.0")]);
    assert_eq!(plan.unresolved.len(), 1);
    assert!(!plan.is_clean());

    let err = DependencyResolver::new(&registry)
        .resolve_install_order(&id("acme:app:1.0"), DependencyHandling::Required)
        .unwrap_err();
    assert!(matches!(err, DependencyError::Unresolved { .. }));
}

#[test]
fn test_highest_version_in_range_is_selected() {
    let temp = TempDir::new().unwrap();
    let registry = registry(&temp);
    registry.register(package("acme:core:1.0", &[])).unwrap();
    registry.register(package("acme:core:1.5", &[])).unwrap();
    registry.register(package("acme:core:2.0", &[])).unwrap();
    registry
        .register(package("acme:bounded:1.0", &["acme:core:[1.0,2.0)"]))
        .unwrap();
    registry
        .register(package("acme:open:1.0", &["acme:core"]))
        .unwrap();
    let resolver = DependencyResolver::new(&registry);

    let bounded = resolver
        .resolve_install_order(&id("acme:bounded:1.0"), DependencyHandling::Required)
        .unwrap();
    assert_eq!(bounded.order[0], id("acme:core:1.5"));

    let open = resolver
        .resolve_install_order(&id("acme:open:1.0"), DependencyHandling::Required)
        .unwrap();
    assert_eq!(open.order[0], id("acme:core:2.0"));
}

#[test]
fn test_uninstall_order_and_usage() {
    let temp = TempDir::new().unwrap();
    let registry = registry(&temp);
    chain(&registry);
    for raw in ["acme:a:1.0", "acme:b:1.0", "acme:c:1.0"] {
        registry.mark_installed(&id(raw), Utc::now()).unwrap();
    }
    let resolver = DependencyResolver::new(&registry);

    assert_eq!(resolver.usage(&id("acme:c:1.0")).unwrap(), vec![id("acme:b:1.0")]);

    let err = resolver
        .resolve_uninstall_order(&id("acme:c:1.0"), DependencyHandling::Strict)
        .unwrap_err();
    assert!(matches!(err, DependencyError::InUse { .. }));

    let plan = resolver
        .resolve_uninstall_order(&id("acme:c:1.0"), DependencyHandling::Required)
        .unwrap();
    assert_eq!(
        plan.order,
        vec![id("acme:a:1.0"), id("acme:b:1.0"), id("acme:c:1.0")]
    );
}

#[test]
fn test_markers_survive_reopen() {
    let temp = TempDir::new().unwrap();
    {
        let registry = registry(&temp);
        chain(&registry);
        registry
            .mark_installed(&id("acme:c:1.0"), Utc::now())
            .unwrap();
        registry.flush().unwrap();
    }
    let registry = registry(&temp);
    assert!(registry.is_installed(&id("acme:c:1.0")).unwrap());
    assert!(!registry.is_installed(&id("acme:a:1.0")).unwrap());
    assert_eq!(registry.packages().unwrap().len(), 3);
}
