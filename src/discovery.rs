//! Repository enumeration
//!
//! Walks an organization's repository listing page by page. This is the only
//! step of a run whose failure is fatal: a partial listing is never returned.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::host::{RemoteRepository, RepositoryHost};

/// Number of repositories requested per listing page
pub const PAGE_SIZE: u32 = 100;

/// Lists every repository of an organization
pub struct RepositoryEnumerator<'a> {
    host: &'a dyn RepositoryHost,
}

impl<'a> RepositoryEnumerator<'a> {
    pub fn new(host: &'a dyn RepositoryHost) -> Self {
        Self { host }
    }

    /// Fetch pages starting at 1 until an empty page comes back
    pub async fn enumerate(&self, org: &str) -> Result<Vec<RemoteRepository>> {
        debug!("Fetching repositories for organization: {}", org);

        let mut repositories = Vec::new();
        let mut page = 1u32;

        loop {
            let items = self
                .host
                .list_repositories(org, page)
                .await
                .with_context(|| {
                    format!("Failed to fetch repositories for organization {} page {}", org, page)
                })?;

            if items.is_empty() {
                break;
            }

            repositories.extend(items);
            page += 1;
        }

        info!(
            "Found {} repositories for organization: {}",
            repositories.len(),
            org
        );
        Ok(repositories)
    }
}
