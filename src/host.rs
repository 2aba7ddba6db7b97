//! Remote repository host abstraction
//!
//! The reconciliation engine talks to the source-hosting service only through
//! [`RepositoryHost`], and to the local filesystem only through [`LocalFiles`].
//! [`crate::GitHubClient`] is the production implementation of the former.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Repository record as listed by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRepository {
    /// Repository name (e.g., "svc-a")
    pub name: String,

    /// Owner login used to address the repository
    pub owner: String,

    /// Primary language, if the host detected one
    pub language: Option<String>,

    /// Whether the repository is archived
    pub archived: bool,
}

impl RemoteRepository {
    /// Get display name (owner/name format)
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Repository permission level that can be granted to a collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    Admin,
    Maintain,
    Write,
    Triage,
    Read,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Maintain => "maintain",
            Role::Write => "write",
            Role::Triage => "triage",
            Role::Read => "read",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a role name is not one of the five repository roles
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown collaborator role '{0}' (expected admin, maintain, write, triage or read)")]
pub struct RoleParseError(pub String);

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "maintain" => Ok(Role::Maintain),
            "write" => Ok(Role::Write),
            "triage" => Ok(Role::Triage),
            "read" => Ok(Role::Read),
            other => Err(RoleParseError(other.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = RoleParseError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

/// Collaborator currently holding access to a repository
///
/// The role is kept as the host reports it, since organizations may define
/// custom roles outside of [`Role`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCollaborator {
    pub username: String,
    pub role: String,
}

/// File object fetched from a repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Decoded file content
    pub content: String,

    /// Blob SHA, required as the revision token when updating
    pub sha: String,
}

/// Operations the reconciliation engine needs from the hosting service
///
/// Every call is a single round trip with no retries. There is no
/// operation that removes a collaborator, a protection rule or a file.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RepositoryHost: Send + Sync {
    /// Fetch one page of an organization's repositories (pages start at 1)
    async fn list_repositories(&self, org: &str, page: u32) -> Result<Vec<RemoteRepository>>;

    /// Fetch the current repository settings object
    async fn get_repository_settings(&self, owner: &str, repo: &str) -> Result<Map<String, Value>>;

    /// Partially update repository settings with exactly the given keys
    async fn update_repository_settings(
        &self,
        owner: &str,
        repo: &str,
        changes: &Map<String, Value>,
    ) -> Result<()>;

    /// List every collaborator of a repository, pending invitees included
    async fn list_collaborators(&self, owner: &str, repo: &str) -> Result<Vec<RemoteCollaborator>>;

    /// Add a collaborator or change an existing collaborator's role
    async fn set_collaborator_permission(
        &self,
        owner: &str,
        repo: &str,
        username: &str,
        role: Role,
    ) -> Result<()>;

    /// Replace the protection rule of a branch
    async fn update_branch_protection(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        rule: &Value,
    ) -> Result<()>;

    /// Fetch a file; `Ok(None)` when the path does not exist
    async fn get_file(&self, owner: &str, repo: &str, path: &str) -> Result<Option<RemoteFile>>;

    /// Create a file that does not exist yet
    async fn create_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        content: &str,
        message: &str,
    ) -> Result<()>;

    /// Overwrite an existing file identified by its current blob SHA
    async fn update_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        content: &str,
        message: &str,
        sha: &str,
    ) -> Result<()>;

    /// List the names of a repository's labels
    async fn list_labels(&self, owner: &str, repo: &str) -> Result<Vec<String>>;
}

/// Read access to files on the machine running the reconciliation
#[async_trait]
pub trait LocalFiles: Send + Sync {
    async fn read_to_string(&self, path: &Path) -> Result<String>;
}

/// [`LocalFiles`] backed by the real filesystem
#[derive(Debug, Clone, Default)]
pub struct FsLocalFiles;

#[async_trait]
impl LocalFiles for FsLocalFiles {
    async fn read_to_string(&self, path: &Path) -> Result<String> {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read local file: {:?}", path))
    }
}
