//! Dependency resolver
//!
//! Orders installs leaves-first and uninstalls dependents-first. Cycles are
//! found with a depth-first walk that tracks the in-progress path: REQUIRED
//! fails on the first back edge, BEST_EFFORT records it and skips the
//! revisited package.

use crate::dependency::registry::{PackageRegistry, RegisteredPackage};
use crate::error::DependencyError;
use crate::import::DependencyHandling;
use crate::package::{Dependency, PackageId};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, instrument, warn};

/// A declared dependency nothing in the registry satisfies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedDependency {
    pub required_by: PackageId,
    pub dependency: Dependency,
}

/// Result of resolving an install or uninstall.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencyPlan {
    /// Packages to process, in order.
    pub order: Vec<PackageId>,
    /// Dependencies skipped under BEST_EFFORT.
    pub unresolved: Vec<UnresolvedDependency>,
    /// Cycles broken under BEST_EFFORT; each ends with its first element.
    pub cycles: Vec<Vec<PackageId>>,
}

impl DependencyPlan {
    fn single(id: &PackageId) -> Self {
        DependencyPlan {
            order: vec![id.clone()],
            ..Self::default()
        }
    }

    pub fn is_clean(&self) -> bool {
        self.unresolved.is_empty() && self.cycles.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Depth-first walk state shared by install and uninstall resolution.
struct Walk {
    policy: DependencyHandling,
    marks: HashMap<PackageId, Mark>,
    path: Vec<PackageId>,
    plan: DependencyPlan,
}

impl Walk {
    fn new(policy: DependencyHandling) -> Self {
        Walk {
            policy,
            marks: HashMap::new(),
            path: Vec::new(),
            plan: DependencyPlan::default(),
        }
    }

    /// Whether `id` still needs a visit. A back edge is a cycle.
    fn should_visit(&mut self, id: &PackageId) -> Result<bool, DependencyError> {
        match self.marks.get(id) {
            Some(Mark::Done) => Ok(false),
            Some(Mark::InProgress) => {
                let start = self.path.iter().position(|p| p == id).unwrap_or(0);
                let mut cycle = self.path[start..].to_vec();
                cycle.push(id.clone());
                if self.policy == DependencyHandling::BestEffort {
                    warn!(
                        cycle = %cycle.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(" -> "),
                        "Breaking dependency cycle"
                    );
                    self.plan.cycles.push(cycle);
                    Ok(false)
                } else {
                    Err(DependencyError::Cyclic { cycle })
                }
            }
            None => Ok(true),
        }
    }

    fn enter(&mut self, id: &PackageId) {
        self.marks.insert(id.clone(), Mark::InProgress);
        self.path.push(id.clone());
    }

    fn leave(&mut self, id: &PackageId) {
        self.path.pop();
        self.marks.insert(id.clone(), Mark::Done);
        self.plan.order.push(id.clone());
    }
}

/// Resolves install and uninstall order against a registry.
pub struct DependencyResolver<'a> {
    registry: &'a dyn PackageRegistry,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(registry: &'a dyn PackageRegistry) -> Self {
        Self { registry }
    }

    /// Packages to install for `requested`, dependencies first, ending with
    /// `requested` itself. Already-installed dependencies are not scheduled.
    #[instrument(skip(self), fields(package = %requested))]
    pub fn resolve_install_order(
        &self,
        requested: &PackageId,
        policy: DependencyHandling,
    ) -> Result<DependencyPlan, DependencyError> {
        let root = self.require(requested)?;
        let packages = self.registry.packages()?;

        match policy {
            DependencyHandling::Ignore => Ok(DependencyPlan::single(requested)),
            DependencyHandling::Strict => {
                let missing: Vec<Dependency> = root
                    .metadata
                    .dependencies
                    .iter()
                    .filter(|dep| !packages.iter().any(|p| p.is_installed() && dep.matches(p.id())))
                    .cloned()
                    .collect();
                if missing.is_empty() {
                    Ok(DependencyPlan::single(requested))
                } else {
                    Err(DependencyError::Unresolved {
                        package: requested.clone(),
                        dependencies: missing,
                    })
                }
            }
            DependencyHandling::Required | DependencyHandling::BestEffort => {
                let by_id: HashMap<&PackageId, &RegisteredPackage> =
                    packages.iter().map(|p| (p.id(), p)).collect();
                let mut walk = Walk::new(policy);
                self.visit_install(&root, &packages, &by_id, &mut walk)?;
                debug!(order = walk.plan.order.len(), "Resolved install order");
                Ok(walk.plan)
            }
        }
    }

    fn visit_install(
        &self,
        package: &RegisteredPackage,
        packages: &[RegisteredPackage],
        by_id: &HashMap<&PackageId, &RegisteredPackage>,
        walk: &mut Walk,
    ) -> Result<(), DependencyError> {
        walk.enter(package.id());
        let mut unresolved = Vec::new();
        for dep in &package.metadata.dependencies {
            if packages.iter().any(|p| p.is_installed() && dep.matches(p.id())) {
                continue;
            }
            let Some(candidate) = select_candidate(dep, packages) else {
                if walk.policy == DependencyHandling::BestEffort {
                    warn!(package = %package.id(), dependency = %dep, "Dependency not available");
                    walk.plan.unresolved.push(UnresolvedDependency {
                        required_by: package.id().clone(),
                        dependency: dep.clone(),
                    });
                } else {
                    unresolved.push(dep.clone());
                }
                continue;
            };
            if !walk.should_visit(candidate.id())? {
                continue;
            }
            if let Some(next) = by_id.get(candidate.id()) {
                self.visit_install(next, packages, by_id, walk)?;
            }
        }
        if !unresolved.is_empty() {
            return Err(DependencyError::Unresolved {
                package: package.id().clone(),
                dependencies: unresolved,
            });
        }
        walk.leave(package.id());
        Ok(())
    }

    /// Installed packages that declare a dependency satisfied by `id`.
    pub fn usage(&self, id: &PackageId) -> Result<Vec<PackageId>, DependencyError> {
        Ok(dependents(id, &self.registry.installed()?))
    }

    /// Packages to uninstall for `target`, dependents first, ending with
    /// `target` itself.
    #[instrument(skip(self), fields(package = %target))]
    pub fn resolve_uninstall_order(
        &self,
        target: &PackageId,
        policy: DependencyHandling,
    ) -> Result<DependencyPlan, DependencyError> {
        let record = self.require(target)?;
        if !record.is_installed() {
            return Err(DependencyError::NotInstalled(target.clone()));
        }
        let installed = self.registry.installed()?;

        match policy {
            DependencyHandling::Ignore => Ok(DependencyPlan::single(target)),
            DependencyHandling::Strict => {
                let users = dependents(target, &installed);
                if users.is_empty() {
                    Ok(DependencyPlan::single(target))
                } else {
                    Err(DependencyError::InUse {
                        package: target.clone(),
                        dependents: users,
                    })
                }
            }
            DependencyHandling::Required | DependencyHandling::BestEffort => {
                let mut walk = Walk::new(policy);
                visit_uninstall(target, &installed, &mut walk)?;
                debug!(order = walk.plan.order.len(), "Resolved uninstall order");
                Ok(walk.plan)
            }
        }
    }

    fn require(&self, id: &PackageId) -> Result<RegisteredPackage, DependencyError> {
        self.registry
            .get(id)?
            .ok_or_else(|| DependencyError::UnknownPackage(id.clone()))
    }
}

fn visit_uninstall(
    id: &PackageId,
    installed: &[RegisteredPackage],
    walk: &mut Walk,
) -> Result<(), DependencyError> {
    walk.enter(id);
    for dependent in dependents(id, installed) {
        if walk.should_visit(&dependent)? {
            visit_uninstall(&dependent, installed, walk)?;
        }
    }
    walk.leave(id);
    Ok(())
}

fn dependents(id: &PackageId, installed: &[RegisteredPackage]) -> Vec<PackageId> {
    installed
        .iter()
        .filter(|p| p.id() != id)
        .filter(|p| p.metadata.dependencies.iter().any(|d| d.matches(id)))
        .map(|p| p.id().clone())
        .collect()
}

/// Highest satisfying version; ties go to the most recent registration.
fn select_candidate<'p>(
    dep: &Dependency,
    packages: &'p [RegisteredPackage],
) -> Option<&'p RegisteredPackage> {
    packages
        .iter()
        .filter(|p| dep.matches(p.id()))
        .max_by(|a, b| compare_candidates(a, b))
}

fn compare_candidates(a: &RegisteredPackage, b: &RegisteredPackage) -> Ordering {
    a.id()
        .version()
        .cmp_precedence(b.id().version())
        .then(a.sequence.cmp(&b.sequence))
}
