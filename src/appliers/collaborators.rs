//! Collaborator roles (add or re-role, never remove)

use std::collections::HashMap;

use super::{ApplyContext, Domain, DomainReport};
use crate::host::{RemoteRepository, Role};
use crate::settings::CollaboratorSpec;

/// What needs to happen for one desired collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorAction {
    Add { username: String, role: Role },
    Update { username: String, from: String, to: Role },
    NoOp { username: String },
}

/// Classify each desired entry against the current collaborator roles
///
/// `current` maps lowercased usernames to the role the host reports. Entries
/// are returned in desired order; nothing is ever planned for collaborators
/// missing from `desired`.
pub fn plan_collaborators(
    current: &HashMap<String, String>,
    desired: &[CollaboratorSpec],
) -> Vec<CollaboratorAction> {
    desired
        .iter()
        .map(|spec| match current.get(&spec.username.to_lowercase()) {
            None => CollaboratorAction::Add {
                username: spec.username.clone(),
                role: spec.role,
            },
            Some(role) if role.as_str() == spec.role.as_str() => CollaboratorAction::NoOp {
                username: spec.username.clone(),
            },
            Some(role) => CollaboratorAction::Update {
                username: spec.username.clone(),
                from: role.clone(),
                to: spec.role,
            },
        })
        .collect()
}

/// Grant every desired collaborator their desired role
///
/// Each add or update is attempted independently; one failure does not stop
/// the rest.
pub async fn apply_collaborators(
    ctx: &ApplyContext<'_>,
    repo: &RemoteRepository,
    desired: &[CollaboratorSpec],
) -> DomainReport {
    let mut report = DomainReport::new(Domain::Collaborators);

    let current = match ctx.host.list_collaborators(&repo.owner, &repo.name).await {
        Ok(list) => list
            .into_iter()
            .map(|c| (c.username.to_lowercase(), c.role))
            .collect::<HashMap<_, _>>(),
        Err(e) => {
            ctx.reporter
                .failure(&repo.name, &format!("Failed to list collaborators: {:#}", e));
            report.failed += 1;
            return report;
        }
    };

    for action in plan_collaborators(&current, desired) {
        let (username, role, description) = match &action {
            CollaboratorAction::NoOp { username } => {
                ctx.reporter.skip(
                    &repo.name,
                    &format!("Collaborator {} already has the desired role", username),
                );
                report.unchanged += 1;
                continue;
            }
            CollaboratorAction::Add { username, role } => {
                (username, *role, format!("add {} as {}", username, role))
            }
            CollaboratorAction::Update { username, from, to } => (
                username,
                *to,
                format!("update {} from {} to {}", username, from, to),
            ),
        };

        if ctx.mode.is_dry_run() {
            ctx.reporter
                .preview(&repo.name, &format!("Would {}", description));
            report.record_change(ctx.mode);
            continue;
        }

        match ctx
            .host
            .set_collaborator_permission(&repo.owner, &repo.name, username, role)
            .await
        {
            Ok(()) => {
                ctx.reporter
                    .success(&repo.name, &format!("Collaborator change applied: {}", description));
                report.record_change(ctx.mode);
            }
            Err(e) => {
                ctx.reporter
                    .failure(&repo.name, &format!("Failed to {}: {:#}", description, e));
                report.failed += 1;
            }
        }
    }

    report
}
