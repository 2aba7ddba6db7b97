//! Branch protection rules (unconditional overwrite)

use serde_json::Value;
use std::collections::HashMap;

use super::{ApplyContext, Domain, DomainReport};
use crate::host::RemoteRepository;

/// Write each desired protection rule over whatever the branch has now
///
/// Current protection is never read: the rule object replaces it wholesale.
/// Branches are independent, so one failure does not stop the others.
pub async fn apply_branch_protection(
    ctx: &ApplyContext<'_>,
    repo: &RemoteRepository,
    desired: &HashMap<String, Value>,
) -> DomainReport {
    let mut report = DomainReport::new(Domain::BranchProtection);

    for (branch, rule) in desired {
        if ctx.mode.is_dry_run() {
            ctx.reporter.preview(
                &repo.name,
                &format!("Would set protection on branch '{}': {}", branch, rule),
            );
            report.record_change(ctx.mode);
            continue;
        }

        match ctx
            .host
            .update_branch_protection(&repo.owner, &repo.name, branch, rule)
            .await
        {
            Ok(()) => {
                ctx.reporter
                    .success(&repo.name, &format!("Updated protection on branch '{}'", branch));
                report.record_change(ctx.mode);
            }
            Err(e) => {
                ctx.reporter.failure(
                    &repo.name,
                    &format!("Failed to update protection on branch '{}': {:#}", branch, e),
                );
                report.failed += 1;
            }
        }
    }

    report
}
