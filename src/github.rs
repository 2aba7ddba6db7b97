use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use octocrab::Octocrab;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::env;
use std::process::Command;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::Config;
use crate::discovery::PAGE_SIZE;
use crate::host::{RemoteCollaborator, RemoteFile, RemoteRepository, RepositoryHost, Role};

type OctocrabResult<T> = octocrab::Result<T>;

/// Only used to percent-encode route segments; octocrab adds the real base URI
const ROUTE_BASE: &str = "https://api.github.com/";

/// GitHub client wrapper with authentication management
pub struct GitHubClient {
    client: Octocrab,
    username: String,
}

/// GitHub authentication strategies
#[derive(Debug, Clone)]
pub enum AuthStrategy {
    /// Use GitHub CLI authentication
    GitHubCLI,
    /// Use environment variable token
    EnvironmentToken,
}

/// Query parameters for paginated list endpoints
#[derive(Serialize)]
struct PageParams {
    per_page: u32,
    page: u32,
}

#[derive(Deserialize)]
struct CollaboratorListing {
    login: String,
    role_name: Option<String>,
    #[serde(default)]
    permissions: Option<PermissionFlags>,
}

#[derive(Deserialize)]
struct PermissionFlags {
    #[serde(default)]
    admin: bool,
    #[serde(default)]
    maintain: bool,
    #[serde(default)]
    push: bool,
    #[serde(default)]
    triage: bool,
    #[serde(default)]
    pull: bool,
}

impl CollaboratorListing {
    /// Role as reported, falling back to the highest permission flag
    fn role(&self) -> String {
        if let Some(role) = &self.role_name {
            return role.clone();
        }

        let flags = self.permissions.as_ref();
        let role = match flags {
            Some(p) if p.admin => Role::Admin.as_str(),
            Some(p) if p.maintain => Role::Maintain.as_str(),
            Some(p) if p.push => Role::Write.as_str(),
            Some(p) if p.triage => Role::Triage.as_str(),
            Some(p) if p.pull => Role::Read.as_str(),
            _ => "none",
        };
        role.to_string()
    }
}

#[derive(Deserialize)]
struct InvitationListing {
    invitee: Option<InviteeListing>,
    permissions: String,
}

#[derive(Deserialize)]
struct InviteeListing {
    login: String,
}

impl InvitationListing {
    /// Invited role, with the legacy permission names mapped to roles
    fn role(&self) -> String {
        match self.permissions.as_str() {
            "pull" => Role::Read.as_str().to_string(),
            "push" => Role::Write.as_str().to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct LabelListing {
    name: String,
}

#[derive(Deserialize)]
struct ContentResponse {
    sha: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

impl ContentResponse {
    /// Files over 1 MB come back without inline content
    fn is_inline(&self) -> bool {
        self.encoding.as_deref() != Some("none") && self.content.is_some()
    }
}

#[derive(Deserialize)]
struct BlobResponse {
    content: String,
}

#[derive(Serialize)]
struct FileWrite<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

impl GitHubClient {
    /// Create a new GitHub client with automatic authentication
    pub async fn new(config: &Config) -> Result<Self> {
        let (auth_strategy, token) = Self::detect_authentication(config)?;

        info!("Using authentication strategy: {:?}", auth_strategy);

        let client = Octocrab::builder()
            .personal_token(token)
            .build()
            .context("Failed to create GitHub client")?;

        // Get authenticated user information
        let user = client
            .current()
            .user()
            .await
            .context("Failed to get current user information. Check your authentication.")?;

        let username = config
            .github
            .username
            .clone()
            .unwrap_or_else(|| user.login.clone());

        info!("Authenticated as GitHub user: {}", username);

        Ok(Self { client, username })
    }

    /// Detect and obtain GitHub authentication
    pub fn detect_authentication(config: &Config) -> Result<(AuthStrategy, String)> {
        match config.github.auth_method.as_str() {
            "auto" => {
                // Try GitHub CLI first, then environment token
                if let Ok(token) = Self::try_github_cli() {
                    Ok((AuthStrategy::GitHubCLI, token))
                } else if let Ok(token) = Self::try_environment_token() {
                    Ok((AuthStrategy::EnvironmentToken, token))
                } else {
                    Err(anyhow!(
                        "No GitHub authentication found. Please either:\n\
                         1. Install and authenticate GitHub CLI: gh auth login\n\
                         2. Set GITHUB_TOKEN environment variable\n\
                         3. Run: repowarden auth setup"
                    ))
                }
            }
            "gh_cli" => {
                let token = Self::try_github_cli()
                    .context("GitHub CLI authentication failed. Run: gh auth login")?;
                Ok((AuthStrategy::GitHubCLI, token))
            }
            "token" => {
                let token = Self::try_environment_token()
                    .context("GITHUB_TOKEN environment variable not found or invalid")?;
                Ok((AuthStrategy::EnvironmentToken, token))
            }
            other => Err(anyhow!("Unknown auth method: {}", other)),
        }
    }

    /// Try to get token from GitHub CLI
    fn try_github_cli() -> Result<String> {
        debug!("Attempting GitHub CLI authentication");

        if !Self::is_command_available("gh") {
            return Err(anyhow!("GitHub CLI (gh) is not installed"));
        }

        let token_output = Command::new("gh")
            .args(["auth", "token"])
            .output()
            .context("Failed to get GitHub CLI token")?;

        if !token_output.status.success() {
            return Err(anyhow!(
                "Failed to retrieve token from GitHub CLI: {}",
                String::from_utf8_lossy(&token_output.stderr)
            ));
        }

        let token = String::from_utf8(token_output.stdout)
            .context("GitHub CLI token is not valid UTF-8")?
            .trim()
            .to_string();

        if token.is_empty() {
            return Err(anyhow!("GitHub CLI returned empty token"));
        }

        debug!("Successfully obtained token from GitHub CLI");
        Ok(token)
    }

    /// Try to get token from environment variable
    fn try_environment_token() -> Result<String> {
        debug!("Attempting environment variable authentication");

        let token = env::var("GITHUB_TOKEN").context("GITHUB_TOKEN environment variable not set")?;

        if token.is_empty() {
            return Err(anyhow!("GITHUB_TOKEN is empty"));
        }

        const PREFIXES: [&str; 4] = ["ghp_", "gho_", "ghs_", "github_pat_"];
        if !PREFIXES.iter().any(|prefix| token.starts_with(prefix)) {
            warn!("GITHUB_TOKEN doesn't look like a valid GitHub token (should start with ghp_, gho_, ghs_ or github_pat_)");
        }

        debug!("Successfully found GITHUB_TOKEN environment variable");
        Ok(token)
    }

    /// Check if a command is available in PATH
    fn is_command_available(command: &str) -> bool {
        Command::new("which")
            .arg(command)
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// Get the authenticated username
    pub fn username(&self) -> &str {
        &self.username
    }

    /// List all organizations the user is a member of
    pub async fn list_user_organizations(&self) -> Result<Vec<String>> {
        debug!("Fetching organizations for user: {}", self.username);

        let orgs = self
            .client
            .current()
            .list_org_memberships_for_authenticated_user()
            .per_page(100)
            .send()
            .await
            .context("Failed to fetch user organizations")?;

        let org_names: Vec<String> = orgs.items.into_iter().map(|org| org.organization.login).collect();

        info!("Found {} organizations: {:?}", org_names.len(), org_names);
        Ok(org_names)
    }

    /// Fetch every page of a list endpoint, stopping at the first short page
    async fn get_all_pages<T>(&self, route: &str) -> OctocrabResult<Vec<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut items = Vec::new();
        let mut page = 1u32;

        loop {
            let params = PageParams {
                per_page: PAGE_SIZE,
                page,
            };
            let batch: Vec<T> = self.client.get(route, Some(&params)).await?;
            let done = (batch.len() as u32) < PAGE_SIZE;
            items.extend(batch);
            if done {
                break;
            }
            page += 1;
        }

        Ok(items)
    }
}

/// Build an API route from raw segments, percent-encoding each one
fn api_route<'a>(segments: impl IntoIterator<Item = &'a str>) -> Result<String> {
    let mut url = Url::parse(ROUTE_BASE).context("Invalid API route base")?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("API route base cannot carry a path"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url.path().to_string())
}

/// Route of a path in the contents API; `/` in `path` separates segments
fn contents_route(owner: &str, repo: &str, path: &str) -> Result<String> {
    api_route(
        ["repos", owner, repo, "contents"]
            .into_iter()
            .chain(path.split('/').filter(|segment| !segment.is_empty())),
    )
}

/// True when GitHub answered 404
fn is_not_found(error: &octocrab::Error) -> bool {
    matches!(error, octocrab::Error::GitHub { source, .. } if source.status_code.as_u16() == 404)
}

/// Decode a contents API payload, which GitHub wraps at 60 columns
fn decode_content(encoded: &str) -> Result<String> {
    let cleaned: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(cleaned)
        .context("File content is not valid base64")?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[async_trait]
impl RepositoryHost for GitHubClient {
    async fn list_repositories(&self, org: &str, page: u32) -> Result<Vec<RemoteRepository>> {
        let page_repos = self
            .client
            .orgs(org)
            .list_repos()
            .per_page(PAGE_SIZE as u8)
            .page(page)
            .send()
            .await
            .with_context(|| format!("Failed to list repositories of {}", org))?;

        Ok(page_repos
            .items
            .into_iter()
            .map(|repo| RemoteRepository {
                owner: repo
                    .owner
                    .as_ref()
                    .map(|o| o.login.clone())
                    .unwrap_or_else(|| org.to_string()),
                language: repo
                    .language
                    .as_ref()
                    .and_then(|v| v.as_str())
                    .map(str::to_string),
                archived: repo.archived.unwrap_or(false),
                name: repo.name,
            })
            .collect())
    }

    async fn get_repository_settings(&self, owner: &str, repo: &str) -> Result<Map<String, Value>> {
        let route = api_route(["repos", owner, repo])?;
        let settings: Map<String, Value> = self
            .client
            .get(&route, None::<&()>)
            .await
            .with_context(|| format!("Failed to fetch settings for {}/{}", owner, repo))?;
        Ok(settings)
    }

    async fn update_repository_settings(
        &self,
        owner: &str,
        repo: &str,
        changes: &Map<String, Value>,
    ) -> Result<()> {
        let route = api_route(["repos", owner, repo])?;
        let _: Value = self
            .client
            .patch(&route, Some(changes))
            .await
            .with_context(|| format!("Failed to update settings for {}/{}", owner, repo))?;
        Ok(())
    }

    async fn list_collaborators(&self, owner: &str, repo: &str) -> Result<Vec<RemoteCollaborator>> {
        let route = api_route(["repos", owner, repo, "collaborators"])?;
        let listing: Vec<CollaboratorListing> = self
            .get_all_pages(&route)
            .await
            .with_context(|| format!("Failed to list collaborators for {}/{}", owner, repo))?;

        let route = api_route(["repos", owner, repo, "invitations"])?;
        let invitations: Vec<InvitationListing> = self
            .get_all_pages(&route)
            .await
            .with_context(|| format!("Failed to list invitations for {}/{}", owner, repo))?;

        let mut collaborators: Vec<RemoteCollaborator> = listing
            .iter()
            .map(|c| RemoteCollaborator {
                username: c.login.clone(),
                role: c.role(),
            })
            .collect();

        // Pending invitees count as collaborators with the invited role
        collaborators.extend(invitations.iter().filter_map(|invitation| {
            invitation.invitee.as_ref().map(|invitee| RemoteCollaborator {
                username: invitee.login.clone(),
                role: invitation.role(),
            })
        }));

        Ok(collaborators)
    }

    async fn set_collaborator_permission(
        &self,
        owner: &str,
        repo: &str,
        username: &str,
        role: Role,
    ) -> Result<()> {
        let route = api_route(["repos", owner, repo, "collaborators", username])?;
        let body = json!({ "permission": role.as_str() });

        // Answers 201 with an invitation or 204 with no body, so skip decoding
        let response = self
            .client
            ._put(route, Some(&body))
            .await
            .with_context(|| format!("Failed to set {} as {} on {}/{}", username, role, owner, repo))?;
        octocrab::map_github_error(response)
            .await
            .with_context(|| format!("Failed to set {} as {} on {}/{}", username, role, owner, repo))?;
        Ok(())
    }

    async fn update_branch_protection(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        rule: &Value,
    ) -> Result<()> {
        let route = api_route(
            ["repos", owner, repo, "branches"]
                .into_iter()
                .chain(branch.split('/'))
                .chain(["protection"]),
        )?;
        let _: Value = self
            .client
            .put(&route, Some(rule))
            .await
            .with_context(|| {
                format!("Failed to update protection for {} on {}/{}", branch, owner, repo)
            })?;
        Ok(())
    }

    async fn get_file(&self, owner: &str, repo: &str, path: &str) -> Result<Option<RemoteFile>> {
        let route = contents_route(owner, repo, path)?;
        let response: OctocrabResult<ContentResponse> = self.client.get(&route, None::<&()>).await;

        match response {
            Ok(file) => {
                let encoded = if file.is_inline() {
                    file.content.unwrap_or_default()
                } else {
                    debug!("{} in {}/{} has no inline content, reading its blob", path, owner, repo);
                    let route = api_route(["repos", owner, repo, "git", "blobs", file.sha.as_str()])?;
                    let blob: BlobResponse = self
                        .client
                        .get(&route, None::<&()>)
                        .await
                        .with_context(|| format!("Failed to fetch blob of {} from {}/{}", path, owner, repo))?;
                    blob.content
                };
                let content = decode_content(&encoded)
                    .with_context(|| format!("Failed to decode {} in {}/{}", path, owner, repo))?;
                Ok(Some(RemoteFile {
                    content,
                    sha: file.sha,
                }))
            }
            Err(e) if is_not_found(&e) => {
                debug!("{} does not exist in {}/{}", path, owner, repo);
                Ok(None)
            }
            Err(e) => Err(e).with_context(|| format!("Failed to fetch {} from {}/{}", path, owner, repo)),
        }
    }

    async fn create_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        content: &str,
        message: &str,
    ) -> Result<()> {
        let route = contents_route(owner, repo, path)?;
        let body = FileWrite {
            message,
            content: STANDARD.encode(content),
            sha: None,
        };
        let _: Value = self
            .client
            .put(&route, Some(&body))
            .await
            .with_context(|| format!("Failed to create {} in {}/{}", path, owner, repo))?;
        Ok(())
    }

    async fn update_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        content: &str,
        message: &str,
        sha: &str,
    ) -> Result<()> {
        let route = contents_route(owner, repo, path)?;
        let body = FileWrite {
            message,
            content: STANDARD.encode(content),
            sha: Some(sha),
        };
        let _: Value = self
            .client
            .put(&route, Some(&body))
            .await
            .with_context(|| format!("Failed to update {} in {}/{}", path, owner, repo))?;
        Ok(())
    }

    async fn list_labels(&self, owner: &str, repo: &str) -> Result<Vec<String>> {
        let route = api_route(["repos", owner, repo, "labels"])?;
        let labels: Vec<LabelListing> = self
            .get_all_pages(&route)
            .await
            .with_context(|| format!("Failed to list labels for {}/{}", owner, repo))?;

        Ok(labels.into_iter().map(|label| label.name).collect())
    }
}

/// Utility functions for GitHub authentication setup
pub mod auth_setup {
    use super::*;

    /// Interactive authentication setup guide
    pub async fn setup_authentication() -> Result<()> {
        println!("🔧 RepoWarden Authentication Setup");
        println!();

        if GitHubClient::is_command_available("gh") {
            println!("✅ GitHub CLI (gh) is installed");

            if Command::new("gh").args(["auth", "status"]).output()?.status.success() {
                println!("✅ GitHub CLI is already authenticated");
            } else {
                println!("🔄 GitHub CLI needs authentication");
                println!("Run: gh auth login");
            }
            return Ok(());
        }

        println!("❌ GitHub CLI (gh) is not installed");
        println!();
        println!("Recommended setup:");
        println!("1. Install GitHub CLI:");

        #[cfg(target_os = "macos")]
        println!("   brew install gh");

        #[cfg(target_os = "linux")]
        println!("   See: https://github.com/cli/cli/blob/trunk/docs/install_linux.md");

        #[cfg(target_os = "windows")]
        println!("   winget install --id GitHub.cli");

        println!();
        println!("2. Authenticate:");
        println!("   gh auth login");
        println!();
        println!("Alternative: Set GITHUB_TOKEN environment variable");
        println!("   export GITHUB_TOKEN=your_token_here");
        println!();
        println!("The token needs the 'repo' scope, plus 'admin:org' read access for");
        println!("organization repositories.");

        Ok(())
    }

    /// Test current authentication
    pub async fn test_authentication(config: &Config) -> Result<()> {
        println!("🔍 Testing GitHub authentication...");

        match GitHubClient::new(config).await {
            Ok(client) => {
                println!("✅ Authentication successful");
                println!("   Username: {}", client.username());

                match client.list_user_organizations().await {
                    Ok(orgs) => {
                        if orgs.is_empty() {
                            println!("   Organizations: None");
                        } else {
                            println!("   Organizations: {}", orgs.join(", "));
                        }
                    }
                    Err(e) => {
                        println!("⚠️  Could not list organizations: {}", e);
                    }
                }
            }
            Err(e) => {
                println!("❌ Authentication failed: {}", e);
                println!();
                println!("To fix this, run: repowarden auth setup");
            }
        }

        Ok(())
    }

    /// Report which authentication source would be used, without calling GitHub
    pub fn show_status(config: &Config) {
        println!("Configured auth method: {}", config.github.auth_method);

        match GitHubClient::detect_authentication(config) {
            Ok((strategy, _)) => println!("✅ Credentials available via {:?}", strategy),
            Err(e) => println!("❌ {}", e),
        }
    }
}
