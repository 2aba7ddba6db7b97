//! Desired-state settings document
//!
//! The document has four independent sections. A missing section means the
//! corresponding domain is left untouched on every repository.
//!
//! ```yaml
//! repository:
//!   has_wiki: false
//!   delete_branch_on_merge: true
//! collaborators:
//!   - username: alice
//!     role: admin
//! branchProtection:
//!   main:
//!     required_status_checks: null
//!     enforce_admins: true
//!     required_pull_request_reviews:
//!       required_approving_review_count: 1
//!     restrictions: null
//! files:
//!   - remotePath: .gitignore
//!     localPath: ./templates/.gitignore
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::host::Role;

/// Target state for every in-scope repository
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DesiredConfiguration {
    /// Repository flags applied through a partial update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<Map<String, Value>>,

    /// Collaborators to add or re-role, in application order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collaborators: Option<Vec<CollaboratorSpec>>,

    /// Branch name to protection rule, written verbatim
    #[serde(default, alias = "branch_protection", skip_serializing_if = "Option::is_none")]
    pub branch_protection: Option<HashMap<String, Value>>,

    /// Files kept in sync with local copies, in application order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileSyncSpec>>,
}

/// Desired access for one user
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CollaboratorSpec {
    pub username: String,
    pub role: Role,
}

/// Remote file tracked against a local file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSyncSpec {
    /// Path inside the repository
    pub remote_path: String,

    /// Path on the machine running the reconciliation
    pub local_path: PathBuf,
}

impl DesiredConfiguration {
    /// Load the desired configuration from a YAML (or JSON) file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {:?}", path))?;

        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse settings file: {:?}", path))
    }

    /// Parse a desired configuration document
    pub fn from_yaml(content: &str) -> Result<Self> {
        let mut settings: DesiredConfiguration =
            serde_yaml::from_str(content).context("Invalid settings document")?;

        settings.expand_paths()?;

        Ok(settings)
    }

    /// Expand `~` and environment variables in local file paths
    pub fn expand_paths(&mut self) -> Result<()> {
        for file in self.files.iter_mut().flatten() {
            let raw = file.local_path.to_string_lossy().into_owned();
            let expanded = shellexpand::full(&raw)
                .with_context(|| format!("Failed to expand local path: {}", raw))?;
            file.local_path = path_clean::clean(&*expanded);
        }

        Ok(())
    }

    /// True when no section is present, so a run would change nothing
    pub fn is_empty(&self) -> bool {
        self.repository.is_none()
            && self.collaborators.is_none()
            && self.branch_protection.is_none()
            && self.files.is_none()
    }
}
