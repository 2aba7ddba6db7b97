//! Per-domain reconcilers
//!
//! Each applier reconciles one settings domain for one repository. Appliers
//! never return errors: every failure is reported through the
//! [`Reporter`](crate::report::Reporter) and counted in the returned
//! [`DomainReport`], so a broken domain cannot stop the others.

pub mod branch_protection;
pub mod collaborators;
pub mod files;
pub mod settings;

use std::fmt;

use crate::host::{LocalFiles, RepositoryHost};
use crate::report::Reporter;

pub use branch_protection::apply_branch_protection;
pub use collaborators::apply_collaborators;
pub use files::{apply_files, commit_message};
pub use settings::apply_repository_settings;

/// Whether mutations are performed or only previewed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Reads and comparisons only; every mutation becomes a preview
    DryRun,
    #[default]
    Live,
}

impl RunMode {
    pub fn from_dry_run(dry_run: bool) -> Self {
        if dry_run {
            RunMode::DryRun
        } else {
            RunMode::Live
        }
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self, RunMode::DryRun)
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::DryRun => f.write_str("dry-run"),
            RunMode::Live => f.write_str("live"),
        }
    }
}

/// The settings domains, in the order they are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Settings,
    Collaborators,
    BranchProtection,
    Files,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Domain::Settings => "settings",
            Domain::Collaborators => "collaborators",
            Domain::BranchProtection => "branch protection",
            Domain::Files => "files",
        };
        f.write_str(name)
    }
}

/// Everything an applier needs to talk to the outside world
pub struct ApplyContext<'a> {
    pub host: &'a dyn RepositoryHost,
    pub local_files: &'a dyn LocalFiles,
    pub reporter: &'a dyn Reporter,
    pub mode: RunMode,
}

/// Item counts for one domain on one repository
///
/// An item is a settings object, a collaborator, a branch or a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainReport {
    pub domain: Domain,
    /// Mutations performed
    pub applied: usize,
    /// Mutations suppressed by dry-run
    pub previewed: usize,
    /// Items already matching the desired state
    pub unchanged: usize,
    /// Items abandoned because of an error
    pub failed: usize,
}

impl DomainReport {
    pub fn new(domain: Domain) -> Self {
        Self {
            domain,
            applied: 0,
            previewed: 0,
            unchanged: 0,
            failed: 0,
        }
    }

    /// Count a change as applied or previewed depending on the mode
    pub(crate) fn record_change(&mut self, mode: RunMode) {
        if mode.is_dry_run() {
            self.previewed += 1;
        } else {
            self.applied += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_mode_from_flag() {
        assert_eq!(RunMode::from_dry_run(true), RunMode::DryRun);
        assert_eq!(RunMode::from_dry_run(false), RunMode::Live);
        assert_eq!(RunMode::default(), RunMode::Live);
        assert_eq!(RunMode::DryRun.to_string(), "dry-run");
    }

    #[test]
    fn test_record_change_respects_mode() {
        let mut report = DomainReport::new(Domain::Files);
        report.record_change(RunMode::DryRun);
        report.record_change(RunMode::Live);
        report.record_change(RunMode::Live);

        assert_eq!(report.previewed, 1);
        assert_eq!(report.applied, 2);
        assert_eq!(report.failed, 0);
    }
}
