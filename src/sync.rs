//! Sync Engine - Orchestrates repository settings reconciliation
//!
//! Enumerates an organization's repositories, filters them, and runs every
//! configured applier on each match in a fixed order: settings, collaborators,
//! branch protection, files. Repositories are reconciled one at a time.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

use crate::appliers::{
    apply_branch_protection, apply_collaborators, apply_files, apply_repository_settings,
    ApplyContext, DomainReport, RunMode,
};
use crate::discovery::RepositoryEnumerator;
use crate::filter::RepositoryFilter;
use crate::host::{LocalFiles, RemoteRepository, RepositoryHost};
use crate::report::Reporter;
use crate::settings::DesiredConfiguration;

/// Results from a complete sync operation
#[derive(Debug, Clone)]
pub struct SyncSummary {
    /// Repositories returned by the enumerator
    pub total_repositories: usize,
    /// Repositories that matched the filter and were reconciled
    pub processed: usize,
    /// Repositories that did not match the filter
    pub skipped: usize,
    /// Domain items that failed across all repositories
    pub failures: usize,
    pub mode: RunMode,
    pub duration: Duration,
}

/// The main sync engine that orchestrates settings reconciliation
#[derive(Clone)]
pub struct SyncEngine {
    host: Arc<dyn RepositoryHost>,
    local_files: Arc<dyn LocalFiles>,
    reporter: Arc<dyn Reporter>,
    filter: RepositoryFilter,
    mode: RunMode,
}

impl SyncEngine {
    /// Create a new sync engine over the given host and local file access
    pub fn new(
        host: Arc<dyn RepositoryHost>,
        local_files: Arc<dyn LocalFiles>,
        reporter: Arc<dyn Reporter>,
        filter: RepositoryFilter,
        mode: RunMode,
    ) -> Self {
        Self {
            host,
            local_files,
            reporter,
            filter,
            mode,
        }
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// Run a complete sync: enumerate, filter and reconcile every match
    ///
    /// Only an enumeration failure is returned as an error; every other
    /// failure is reported and counted in the summary.
    pub async fn run_sync(&self, org: &str, desired: &DesiredConfiguration) -> Result<SyncSummary> {
        let start_time = Instant::now();

        info!("Starting settings reconciliation for {} ({} mode)", org, self.mode);

        let repositories = RepositoryEnumerator::new(self.host.as_ref())
            .enumerate(org)
            .await
            .context("Failed to discover repositories")?;

        let mut summary = SyncSummary {
            total_repositories: repositories.len(),
            processed: 0,
            skipped: 0,
            failures: 0,
            mode: self.mode,
            duration: Duration::ZERO,
        };

        for repo in &repositories {
            if !self.is_in_scope(repo).await {
                summary.skipped += 1;
                continue;
            }

            let reports = self.reconcile_repository(repo, desired).await;
            summary.failures += reports.iter().map(|r| r.failed).sum::<usize>();
            summary.processed += 1;
        }

        summary.duration = start_time.elapsed();

        self.reporter.info(
            "",
            &format!(
                "Sync completed in {:.2}s ({}): {} repositories, {} processed, {} skipped, {} failures",
                summary.duration.as_secs_f64(),
                summary.mode,
                summary.total_repositories,
                summary.processed,
                summary.skipped,
                summary.failures
            ),
        );

        Ok(summary)
    }

    /// List the repositories a sync would reconcile, without touching them
    pub async fn in_scope_repositories(&self, org: &str) -> Result<Vec<RemoteRepository>> {
        let repositories = RepositoryEnumerator::new(self.host.as_ref())
            .enumerate(org)
            .await
            .context("Failed to discover repositories")?;

        let mut in_scope = Vec::new();
        for repo in repositories {
            if self.is_in_scope(&repo).await {
                in_scope.push(repo);
            }
        }

        Ok(in_scope)
    }

    async fn is_in_scope(&self, repo: &RemoteRepository) -> bool {
        let matched = self
            .filter
            .should_process(self.host.as_ref(), self.reporter.as_ref(), repo)
            .await;

        if !matched {
            self.reporter.skip(&repo.name, "Repository does not match filter");
        }
        matched
    }

    /// Apply every configured domain to one repository, in order
    pub async fn reconcile_repository(
        &self,
        repo: &RemoteRepository,
        desired: &DesiredConfiguration,
    ) -> Vec<DomainReport> {
        let ctx = ApplyContext {
            host: self.host.as_ref(),
            local_files: self.local_files.as_ref(),
            reporter: self.reporter.as_ref(),
            mode: self.mode,
        };

        self.reporter.info(&repo.name, "Reconciling repository");

        let mut reports = Vec::new();

        if let Some(settings) = &desired.repository {
            reports.push(apply_repository_settings(&ctx, repo, settings).await);
        }
        if let Some(collaborators) = &desired.collaborators {
            reports.push(apply_collaborators(&ctx, repo, collaborators).await);
        }
        if let Some(rules) = &desired.branch_protection {
            reports.push(apply_branch_protection(&ctx, repo, rules).await);
        }
        if let Some(files) = &desired.files {
            reports.push(apply_files(&ctx, repo, files).await);
        }

        reports
    }
}
