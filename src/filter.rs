//! Repository scope predicates
//!
//! A [`FilterSpec`] is the user-facing description (config file or CLI flags);
//! [`RepositoryFilter`] is its compiled form used during a run.

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::host::{RemoteRepository, RepositoryHost};
use crate::report::Reporter;

/// Which repositories a run applies to
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    /// Regular expression searched for in the repository name
    #[serde(default)]
    pub name_pattern: Option<String>,

    /// Label that must exist on the repository
    #[serde(default)]
    pub label: Option<String>,

    /// Primary language, compared case-insensitively
    #[serde(default)]
    pub language: Option<String>,
}

impl FilterSpec {
    pub fn is_empty(&self) -> bool {
        self.name_pattern.is_none() && self.label.is_none() && self.language.is_none()
    }

    /// Overlay values from `other` wherever they are set
    pub fn merge(mut self, other: FilterSpec) -> FilterSpec {
        if other.name_pattern.is_some() {
            self.name_pattern = other.name_pattern;
        }
        if other.label.is_some() {
            self.label = other.label;
        }
        if other.language.is_some() {
            self.language = other.language;
        }
        self
    }
}

/// Compiled repository filter
#[derive(Debug, Clone, Default)]
pub struct RepositoryFilter {
    name_pattern: Option<Regex>,
    label: Option<String>,
    language: Option<String>,
}

impl RepositoryFilter {
    /// Compile a filter specification; an invalid name pattern is an error
    pub fn new(spec: &FilterSpec) -> Result<Self> {
        let name_pattern = spec
            .name_pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .with_context(|| {
                format!(
                    "Invalid repository name pattern: {}",
                    spec.name_pattern.as_deref().unwrap_or_default()
                )
            })?;

        Ok(Self {
            name_pattern,
            label: spec.label.clone(),
            language: spec.language.clone(),
        })
    }

    /// True when no predicate is configured
    pub fn is_empty(&self) -> bool {
        self.name_pattern.is_none() && self.label.is_none() && self.language.is_none()
    }

    /// Decide whether `repo` is in scope for this run
    ///
    /// With no predicate configured every repository matches, archived ones
    /// included. Otherwise archived repositories never match and every
    /// configured predicate must hold. Labels are fetched only when a label
    /// predicate exists and everything else already matched; a failed fetch
    /// counts as a mismatch.
    pub async fn should_process(
        &self,
        host: &dyn RepositoryHost,
        reporter: &dyn Reporter,
        repo: &RemoteRepository,
    ) -> bool {
        if self.is_empty() {
            return true;
        }

        if repo.archived {
            debug!("Excluding archived repository: {}", repo.name);
            return false;
        }

        if let Some(pattern) = &self.name_pattern {
            if !pattern.is_match(&repo.name) {
                debug!("Excluding repository due to name pattern: {}", repo.name);
                return false;
            }
        }

        if let Some(language) = &self.language {
            let matches = repo
                .language
                .as_deref()
                .is_some_and(|actual| actual.to_lowercase() == language.to_lowercase());
            if !matches {
                debug!("Excluding repository due to language: {}", repo.name);
                return false;
            }
        }

        if let Some(label) = &self.label {
            match host.list_labels(&repo.owner, &repo.name).await {
                Ok(labels) => {
                    if !labels.iter().any(|name| name == label) {
                        debug!("Excluding repository without label '{}': {}", label, repo.name);
                        return false;
                    }
                }
                Err(e) => {
                    reporter.warning(
                        &repo.name,
                        &format!("Failed to fetch labels, treating as non-matching: {:#}", e),
                    );
                    return false;
                }
            }
        }

        true
    }
}
