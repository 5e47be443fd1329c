//! Property-based checks for filter resolution and version ordering

use contentpkg::package::Version;
use contentpkg::{FilterSet, ImportMode, NodePath, WorkspaceFilter};
use proptest::prelude::*;

fn nested_filter() -> WorkspaceFilter {
    WorkspaceFilter::new()
        .with_set(FilterSet::parse("/a").unwrap().with_mode(ImportMode::Merge))
        .unwrap()
        .with_set(FilterSet::parse("/a/b").unwrap().with_mode(ImportMode::Update))
        .unwrap()
}

fn to_path(segments: &[String]) -> NodePath {
    NodePath::parse(&format!("/{}", segments.join("/"))).unwrap()
}

/// The deepest enclosing root decides the mode
#[test]
fn test_mode_for_follows_deepest_root() {
    let mut runner = proptest::test_runner::TestRunner::default();
    let filter = nested_filter();
    let a = NodePath::parse("/a").unwrap();
    let b = NodePath::parse("/a/b").unwrap();

    runner
        .run(&prop::collection::vec("[a-c]", 1..5), |segments| {
            let path = to_path(&segments);
            let expected = if b.is_ancestor_or_self(&path) {
                Some(ImportMode::Update)
            } else if a.is_ancestor_or_self(&path) {
                Some(ImportMode::Merge)
            } else {
                None
            };
            prop_assert_eq!(filter.mode_for(&path), expected);
            Ok(())
        })
        .unwrap();
}

/// Only paths that are neither under a root nor above one may be skipped
#[test]
fn test_skips_subtree_outside_roots() {
    let mut runner = proptest::test_runner::TestRunner::default();
    let filter = WorkspaceFilter::new()
        .with_set(FilterSet::parse("/b/c").unwrap())
        .unwrap();
    let root = NodePath::parse("/b/c").unwrap();

    runner
        .run(&prop::collection::vec("[a-c]", 1..5), |segments| {
            let path = to_path(&segments);
            let related = root.is_ancestor_or_self(&path) || path.is_ancestor_of(&root);
            prop_assert_eq!(filter.skips_subtree(&path), !related);
            if filter.covers(&path) {
                prop_assert!(!filter.skips_subtree(&path));
            }
            Ok(())
        })
        .unwrap();
}

/// Dotted numeric versions order like their numeric tuples
#[test]
fn test_version_order_matches_numeric_order() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &((0u32..20, 0u32..20, 0u32..20), (0u32..20, 0u32..20, 0u32..20)),
            |(left, right)| {
                let lv = Version::new(format!("{}.{}.{}", left.0, left.1, left.2));
                let rv = Version::new(format!("{}.{}.{}", right.0, right.1, right.2));
                prop_assert_eq!(lv.cmp(&rv), left.cmp(&right));
                Ok(())
            },
        )
        .unwrap();
}

/// Joining a name and taking the parent returns the original path
#[test]
fn test_join_then_parent() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(prop::collection::vec("[a-z]{1,6}", 0..4), "[a-z]{1,6}"),
            |(segments, name)| {
                let base = if segments.is_empty() {
                    NodePath::root()
                } else {
                    to_path(&segments)
                };
                let child = base.join(&name);
                prop_assert_eq!(child.name(), name.as_str());
                prop_assert_eq!(child.parent(), Some(base.clone()));
                prop_assert!(base.is_parent_of(&child));
                Ok(())
            },
        )
        .unwrap();
}
