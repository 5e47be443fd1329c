//! Package Manager
//!
//! Installs and uninstalls packages: resolves the order, opens each archive
//! through the provider, runs the importer and keeps the registry markers in
//! step with successful runs.

use crate::archive::ArchiveProvider;
use crate::dependency::{DependencyPlan, DependencyResolver, PackageRegistry, RegisteredPackage};
use crate::error::{DependencyError, ImportError, PackageError};
use crate::filter::WorkspaceFilter;
use crate::import::{Action, ImportOptions, ImportReport, Importer};
use crate::package::{PackageId, PackageMetadata};
use crate::tree::{NodePath, Repository};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument, warn};

/// Report of one package within an install.
#[derive(Debug, Clone, Serialize)]
pub struct PackageReport {
    pub package: PackageId,
    pub report: ImportReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstallResult {
    pub plan: DependencyPlan,
    /// One report per package processed, in plan order. Processing stops at
    /// the first package whose report has errors.
    pub reports: Vec<PackageReport>,
}

impl InstallResult {
    pub fn has_errors(&self) -> bool {
        self.reports.iter().any(|r| r.report.has_errors())
    }

    /// Packages marked installed by this run.
    pub fn installed(&self) -> impl Iterator<Item = &PackageId> {
        self.reports
            .iter()
            .filter(|r| !r.report.has_errors())
            .map(|r| &r.package)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UninstallResult {
    pub plan: DependencyPlan,
    /// Removed paths per package, in plan order.
    pub removed: Vec<(PackageId, Vec<NodePath>)>,
}

/// Drives installs and uninstalls against one registry and archive provider.
pub struct PackageManager<'a> {
    registry: &'a dyn PackageRegistry,
    provider: &'a dyn ArchiveProvider,
}

impl<'a> PackageManager<'a> {
    pub fn new(registry: &'a dyn PackageRegistry, provider: &'a dyn ArchiveProvider) -> Self {
        Self { registry, provider }
    }

    pub fn registry(&self) -> &dyn PackageRegistry {
        self.registry
    }

    /// Make a package available for installation.
    pub fn register(&self, metadata: PackageMetadata) -> Result<RegisteredPackage, PackageError> {
        Ok(self.registry.register(metadata)?)
    }

    pub fn resolver(&self) -> DependencyResolver<'a> {
        DependencyResolver::new(self.registry)
    }

    /// Install `id` and whatever `options.dependency_handling` schedules
    /// before it. Strict runs return the first fatal error.
    #[instrument(skip(self, repo, options), fields(package = %id))]
    pub fn install(
        &self,
        id: &PackageId,
        repo: &mut dyn Repository,
        options: &ImportOptions,
    ) -> Result<InstallResult, PackageError> {
        let plan = self
            .resolver()
            .resolve_install_order(id, options.dependency_handling)?;
        info!(packages = plan.order.len(), "Installing");

        let mut reports = Vec::with_capacity(plan.order.len());
        for package in &plan.order {
            let record = self.record(package)?;
            let mut archive = self.provider.open_archive(package)?;
            let importer = Importer::for_package(options.clone(), &record.metadata.filter);
            let report = importer.run_archive(archive.as_mut(), repo)?;

            let failed = report.has_errors();
            if failed {
                warn!(package = %package, summary = %report.summary(), "Package installed with errors");
            } else {
                self.registry.mark_installed(package, Utc::now())?;
                info!(package = %package, summary = %report.summary(), "Package installed");
            }
            reports.push(PackageReport {
                package: package.clone(),
                report,
            });
            if failed {
                break;
            }
        }
        Ok(InstallResult { plan, reports })
    }

    /// Uninstall `id` and, depending on the policy, its dependents. Covered
    /// content under each package's filter roots is removed; nodes the filter
    /// excludes, and their ancestors, stay.
    #[instrument(skip(self, repo, options), fields(package = %id))]
    pub fn uninstall(
        &self,
        id: &PackageId,
        repo: &mut dyn Repository,
        options: &ImportOptions,
    ) -> Result<UninstallResult, PackageError> {
        let plan = self
            .resolver()
            .resolve_uninstall_order(id, options.dependency_handling)?;
        info!(packages = plan.order.len(), "Uninstalling");

        let mut removed = Vec::with_capacity(plan.order.len());
        for package in &plan.order {
            let record = self.record(package)?;
            let filter = &record.metadata.filter;
            let mut paths = Vec::new();
            if filter.is_empty() {
                warn!(package = %package, "Package has no filter, leaving content in place");
            }
            for root in top_level_roots(filter) {
                remove_covered(repo, filter, &root, options, &mut paths)?;
            }
            repo.commit().map_err(ImportError::from)?;
            self.registry.mark_uninstalled(package)?;
            info!(package = %package, removed = paths.len(), "Package uninstalled");
            removed.push((package.clone(), paths));
        }
        Ok(UninstallResult { plan, removed })
    }

    fn record(&self, id: &PackageId) -> Result<RegisteredPackage, PackageError> {
        self.registry
            .get(id)?
            .ok_or_else(|| DependencyError::UnknownPackage(id.clone()).into())
    }
}

/// Filter roots not nested under an earlier root.
fn top_level_roots(filter: &WorkspaceFilter) -> Vec<NodePath> {
    let mut roots: Vec<NodePath> = Vec::new();
    for set in filter.sets() {
        if !roots.iter().any(|r| r.is_ancestor_or_self(set.root())) {
            roots.push(set.root().clone());
        }
    }
    roots
}

/// Post-order removal of covered nodes. Returns whether `path` is gone.
fn remove_covered(
    repo: &mut dyn Repository,
    filter: &WorkspaceFilter,
    path: &NodePath,
    options: &ImportOptions,
    removed: &mut Vec<NodePath>,
) -> Result<bool, PackageError> {
    let Some(node) = repo.find(path).map_err(ImportError::from)? else {
        return Ok(true);
    };
    let mut children_gone = true;
    for child in &node.children {
        if !remove_covered(repo, filter, &path.join(child), options, removed)? {
            children_gone = false;
        }
    }
    if path.is_root() || !children_gone || !filter.covers(path) {
        return Ok(false);
    }
    repo.remove(path).map_err(ImportError::from)?;
    options
        .listener
        .on_message(options.listener_mode, Action::Deleted, path);
    removed.push(path.clone());
    Ok(true)
}
