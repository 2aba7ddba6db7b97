//! Common test utilities for RepoWarden integration tests
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use repowarden::host::{RemoteCollaborator, RemoteFile, RemoteRepository, RepositoryHost, Role};
use repowarden::report::{Category, Reporter};

/// A mutating call received by [`FakeHost`]
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    UpdateSettings {
        repo: String,
        changes: Map<String, Value>,
    },
    SetPermission {
        repo: String,
        username: String,
        role: Role,
    },
    UpdateBranchProtection {
        repo: String,
        branch: String,
        rule: Value,
    },
    CreateFile {
        repo: String,
        path: String,
        content: String,
        message: String,
    },
    UpdateFile {
        repo: String,
        path: String,
        content: String,
        message: String,
        sha: String,
    },
}

/// Remote state of one repository held by [`FakeHost`]
#[derive(Debug, Clone, Default)]
pub struct FakeRepository {
    pub language: Option<String>,
    pub archived: bool,
    pub settings: Map<String, Value>,
    pub collaborators: Vec<RemoteCollaborator>,
    pub files: HashMap<String, RemoteFile>,
    pub labels: Vec<String>,
}

impl FakeRepository {
    pub fn with_language(mut self, language: &str) -> Self {
        self.language = Some(language.to_string());
        self
    }

    pub fn archived(mut self) -> Self {
        self.archived = true;
        self
    }

    pub fn with_setting(mut self, key: &str, value: Value) -> Self {
        self.settings.insert(key.to_string(), value);
        self
    }

    pub fn with_collaborator(mut self, username: &str, role: &str) -> Self {
        self.collaborators.push(RemoteCollaborator {
            username: username.to_string(),
            role: role.to_string(),
        });
        self
    }

    pub fn with_file(mut self, path: &str, content: &str, sha: &str) -> Self {
        self.files.insert(
            path.to_string(),
            RemoteFile {
                content: content.to_string(),
                sha: sha.to_string(),
            },
        );
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.labels.push(label.to_string());
        self
    }
}

/// In-memory repository host that records every mutation it receives
///
/// Mutations are recorded but never applied, so a second pass sees the same
/// remote state as the first.
pub struct FakeHost {
    owner: String,
    repositories: Vec<(String, FakeRepository)>,
    failing: Mutex<HashSet<&'static str>>,
    mutations: Mutex<Vec<Mutation>>,
    label_fetches: Mutex<usize>,
}

impl FakeHost {
    pub fn new(owner: &str) -> Self {
        Self {
            owner: owner.to_string(),
            repositories: Vec::new(),
            failing: Mutex::new(HashSet::new()),
            mutations: Mutex::new(Vec::new()),
            label_fetches: Mutex::new(0),
        }
    }

    pub fn with_repository(mut self, name: &str, repo: FakeRepository) -> Self {
        self.repositories.push((name.to_string(), repo));
        self
    }

    /// Make every call of the named host operation fail
    pub fn fail_on(self, operation: &'static str) -> Self {
        self.failing.lock().unwrap().insert(operation);
        self
    }

    pub fn mutations(&self) -> Vec<Mutation> {
        self.mutations.lock().unwrap().clone()
    }

    pub fn label_fetches(&self) -> usize {
        *self.label_fetches.lock().unwrap()
    }

    fn check(&self, operation: &'static str) -> Result<()> {
        if self.failing.lock().unwrap().contains(operation) {
            Err(anyhow!("{} failed: 500 Internal Server Error", operation))
        } else {
            Ok(())
        }
    }

    fn repository(&self, name: &str) -> Result<&FakeRepository> {
        self.repositories
            .iter()
            .find(|(repo_name, _)| repo_name == name)
            .map(|(_, repo)| repo)
            .ok_or_else(|| anyhow!("404 Not Found: {}", name))
    }

    fn record(&self, mutation: Mutation) {
        self.mutations.lock().unwrap().push(mutation);
    }
}

#[async_trait]
impl RepositoryHost for FakeHost {
    async fn list_repositories(&self, org: &str, page: u32) -> Result<Vec<RemoteRepository>> {
        self.check("list_repositories")?;
        if org != self.owner || page > 1 {
            return Ok(Vec::new());
        }

        Ok(self
            .repositories
            .iter()
            .map(|(name, repo)| RemoteRepository {
                name: name.clone(),
                owner: self.owner.clone(),
                language: repo.language.clone(),
                archived: repo.archived,
            })
            .collect())
    }

    async fn get_repository_settings(&self, _owner: &str, repo: &str) -> Result<Map<String, Value>> {
        self.check("get_repository_settings")?;
        Ok(self.repository(repo)?.settings.clone())
    }

    async fn update_repository_settings(
        &self,
        _owner: &str,
        repo: &str,
        changes: &Map<String, Value>,
    ) -> Result<()> {
        self.check("update_repository_settings")?;
        self.record(Mutation::UpdateSettings {
            repo: repo.to_string(),
            changes: changes.clone(),
        });
        Ok(())
    }

    async fn list_collaborators(&self, _owner: &str, repo: &str) -> Result<Vec<RemoteCollaborator>> {
        self.check("list_collaborators")?;
        Ok(self.repository(repo)?.collaborators.clone())
    }

    async fn set_collaborator_permission(
        &self,
        _owner: &str,
        repo: &str,
        username: &str,
        role: Role,
    ) -> Result<()> {
        self.check("set_collaborator_permission")?;
        self.record(Mutation::SetPermission {
            repo: repo.to_string(),
            username: username.to_string(),
            role,
        });
        Ok(())
    }

    async fn update_branch_protection(
        &self,
        _owner: &str,
        repo: &str,
        branch: &str,
        rule: &Value,
    ) -> Result<()> {
        self.check("update_branch_protection")?;
        self.record(Mutation::UpdateBranchProtection {
            repo: repo.to_string(),
            branch: branch.to_string(),
            rule: rule.clone(),
        });
        Ok(())
    }

    async fn get_file(&self, _owner: &str, repo: &str, path: &str) -> Result<Option<RemoteFile>> {
        self.check("get_file")?;
        Ok(self.repository(repo)?.files.get(path).cloned())
    }

    async fn create_file(
        &self,
        _owner: &str,
        repo: &str,
        path: &str,
        content: &str,
        message: &str,
    ) -> Result<()> {
        self.check("create_file")?;
        self.record(Mutation::CreateFile {
            repo: repo.to_string(),
            path: path.to_string(),
            content: content.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }

    async fn update_file(
        &self,
        _owner: &str,
        repo: &str,
        path: &str,
        content: &str,
        message: &str,
        sha: &str,
    ) -> Result<()> {
        self.check("update_file")?;
        self.record(Mutation::UpdateFile {
            repo: repo.to_string(),
            path: path.to_string(),
            content: content.to_string(),
            message: message.to_string(),
            sha: sha.to_string(),
        });
        Ok(())
    }

    async fn list_labels(&self, _owner: &str, repo: &str) -> Result<Vec<String>> {
        *self.label_fetches.lock().unwrap() += 1;
        self.check("list_labels")?;
        Ok(self.repository(repo)?.labels.clone())
    }
}

/// Reporter that keeps every event for later assertions
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<(Category, String, String)>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<(Category, String, String)> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, category: Category) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _, _)| *c == category)
            .count()
    }

    pub fn messages(&self, category: Category) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _, _)| *c == category)
            .map(|(_, repo, message)| format!("{}: {}", repo, message))
            .collect()
    }
}

impl Reporter for RecordingReporter {
    fn emit(&self, category: Category, repo: &str, message: &str) {
        self.events
            .lock()
            .unwrap()
            .push((category, repo.to_string(), message.to_string()));
    }
}

/// Assertion helpers for test validation
pub fn assert_contains_any(texts: &[String], expected: &str) {
    assert!(
        texts.iter().any(|text| text.contains(expected)),
        "Expected one of {:?} to contain '{}'",
        texts,
        expected
    );
}
