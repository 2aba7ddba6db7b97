//! RepoWarden - Declarative GitHub Repository Settings Reconciliation
//!
//! RepoWarden keeps the repositories of an organization aligned with a desired-state
//! settings document, applying only the differences and never removing access.
//!
//! ## Core Features
//!
//! - **Repository Discovery**: Paginated enumeration of an organization's repositories
//! - **Filtering**: Name pattern, primary language and label predicates
//! - **Settings Domains**: Repository flags, collaborators, branch protection, tracked files
//! - **Dry Run**: Every read and comparison, no mutations
//! - **Authentication**: GitHub CLI and token-based authentication support
//!
//! ## Modules
//!
//! - [`config`]: Tool configuration management and parsing
//! - [`settings`]: The desired-state settings document
//! - [`sync`]: The reconciliation engine
//! - [`appliers`]: Per-domain reconcilers
//! - [`github`]: GitHub API integration and authentication

pub mod appliers;
pub mod config;
pub mod diff;
pub mod discovery;
pub mod filter;
pub mod github;
pub mod host;
pub mod report;
pub mod settings;
pub mod sync;

pub use appliers::{Domain, DomainReport, RunMode};
pub use config::Config;
pub use filter::{FilterSpec, RepositoryFilter};
pub use github::GitHubClient;
pub use host::{FsLocalFiles, LocalFiles, RemoteRepository, RepositoryHost, Role};
pub use report::{Category, Reporter, TracingReporter};
pub use settings::DesiredConfiguration;
pub use sync::{SyncEngine, SyncSummary};
