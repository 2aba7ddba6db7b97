//! Core repository flags (diff, then partial update)

use serde_json::{Map, Value};

use super::{ApplyContext, Domain, DomainReport};
use crate::diff::{diff, DiffResult};
use crate::host::RemoteRepository;

/// Bring repository settings in line with `desired`
///
/// Only keys of `desired` are compared, and only the differing ones are sent.
pub async fn apply_repository_settings(
    ctx: &ApplyContext<'_>,
    repo: &RemoteRepository,
    desired: &Map<String, Value>,
) -> DomainReport {
    let mut report = DomainReport::new(Domain::Settings);

    let current = match ctx.host.get_repository_settings(&repo.owner, &repo.name).await {
        Ok(current) => current,
        Err(e) => {
            ctx.reporter
                .failure(&repo.name, &format!("Failed to fetch repository settings: {:#}", e));
            report.failed += 1;
            return report;
        }
    };

    let changes = diff(&current, desired);
    if changes.is_empty() {
        ctx.reporter.skip(&repo.name, "Repository settings already up to date");
        report.unchanged += 1;
        return report;
    }

    let summary = describe(&changes);

    if ctx.mode.is_dry_run() {
        ctx.reporter
            .preview(&repo.name, &format!("Would update repository settings: {}", summary));
        report.record_change(ctx.mode);
        return report;
    }

    match ctx
        .host
        .update_repository_settings(&repo.owner, &repo.name, changes.changes())
        .await
    {
        Ok(()) => {
            ctx.reporter
                .success(&repo.name, &format!("Updated repository settings: {}", summary));
            report.record_change(ctx.mode);
        }
        Err(e) => {
            ctx.reporter.failure(
                &repo.name,
                &format!("Failed to update repository settings ({}): {:#}", summary, e),
            );
            report.failed += 1;
        }
    }

    report
}

/// Render `key=value` pairs for the log
fn describe(changes: &DiffResult) -> String {
    changes
        .changes()
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(", ")
}
