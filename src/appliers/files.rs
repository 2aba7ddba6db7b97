//! Tracked file contents (create or update from a local copy)

use super::{ApplyContext, Domain, DomainReport};
use crate::host::{RemoteFile, RemoteRepository};
use crate::settings::FileSyncSpec;

/// Commit message for writing `path`, depending on whether it already exists
pub fn commit_message(path: &str, exists: bool) -> String {
    if exists {
        format!("Update {}", path)
    } else {
        format!("Add {}", path)
    }
}

/// Sync every tracked file; each file succeeds or fails on its own
pub async fn apply_files(
    ctx: &ApplyContext<'_>,
    repo: &RemoteRepository,
    desired: &[FileSyncSpec],
) -> DomainReport {
    let mut report = DomainReport::new(Domain::Files);

    for spec in desired {
        sync_file(ctx, repo, spec, &mut report).await;
    }

    report
}

async fn sync_file(
    ctx: &ApplyContext<'_>,
    repo: &RemoteRepository,
    spec: &FileSyncSpec,
    report: &mut DomainReport,
) {
    let path = spec.remote_path.as_str();

    let local = match ctx.local_files.read_to_string(&spec.local_path).await {
        Ok(content) => content,
        Err(e) => {
            ctx.reporter
                .failure(&repo.name, &format!("Failed to read local file for {}: {:#}", path, e));
            report.failed += 1;
            return;
        }
    };

    let remote = match ctx.host.get_file(&repo.owner, &repo.name, path).await {
        Ok(remote) => remote,
        Err(e) => {
            ctx.reporter
                .failure(&repo.name, &format!("Failed to fetch {}: {:#}", path, e));
            report.failed += 1;
            return;
        }
    };

    if let Some(RemoteFile { content, .. }) = &remote {
        if *content == local {
            ctx.reporter.skip(&repo.name, &format!("{} is already up to date", path));
            report.unchanged += 1;
            return;
        }
    }

    let message = commit_message(path, remote.is_some());

    if ctx.mode.is_dry_run() {
        let action = if remote.is_some() { "update" } else { "create" };
        ctx.reporter.preview(
            &repo.name,
            &format!("Would {} {} ({} bytes)", action, path, local.len()),
        );
        report.record_change(ctx.mode);
        return;
    }

    let result = match &remote {
        Some(existing) => {
            ctx.host
                .update_file(&repo.owner, &repo.name, path, &local, &message, &existing.sha)
                .await
        }
        None => {
            ctx.host
                .create_file(&repo.owner, &repo.name, path, &local, &message)
                .await
        }
    };

    match result {
        Ok(()) => {
            ctx.reporter.success(&repo.name, &message);
            report.record_change(ctx.mode);
        }
        Err(e) => {
            ctx.reporter
                .failure(&repo.name, &format!("Failed to write {}: {:#}", path, e));
            report.failed += 1;
        }
    }
}
