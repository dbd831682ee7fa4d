//! In-memory API client used by the unit tests

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use dashgen_core::{not_found_error, DashgenError, DashgenResult, ErrorContext};

use super::{
    CommitInfo, DirectoryEntry, ReleaseInfo, RepositoryApiClient, RepositoryFile,
    RepositoryMetadata,
};

/// Canned responses keyed by `owner/repo` (plus branch or path where relevant).
/// Every call is recorded so tests can assert which endpoints were used.
#[derive(Default)]
pub(crate) struct MockApiClient {
    default_branches: HashMap<String, String>,
    branches: HashMap<String, Vec<String>>,
    commits: HashMap<String, String>,
    releases: HashMap<String, String>,
    trees: HashMap<String, Vec<RepositoryFile>>,
    directories: HashMap<String, Vec<DirectoryEntry>>,
    files: HashMap<String, String>,
    failures: HashMap<String, u16>,
    calls: Mutex<Vec<String>>,
}

fn http_error(status: u16, operation: &str, key: &str) -> DashgenError {
    DashgenError::Repository {
        message: format!("HTTP {} error for {}", status, key),
        status: Some(status),
        source: None,
        context: ErrorContext::new("mock_api_client")
            .with_operation(operation)
            .with_metadata("url", key),
    }
}

impl MockApiClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a repository with its default branch and latest commit timestamp
    pub fn with_repo(mut self, full_name: &str, default_branch: &str, committed_at: &str) -> Self {
        self.default_branches
            .insert(full_name.to_string(), default_branch.to_string());
        self.branches
            .entry(full_name.to_string())
            .or_default()
            .push(default_branch.to_string());
        self.commits
            .insert(full_name.to_string(), committed_at.to_string());
        self
    }

    pub fn with_branch(mut self, full_name: &str, branch: &str) -> Self {
        self.branches
            .entry(full_name.to_string())
            .or_default()
            .push(branch.to_string());
        self
    }

    pub fn with_release(mut self, full_name: &str, tag: &str) -> Self {
        self.releases.insert(full_name.to_string(), tag.to_string());
        self
    }

    /// Tree entries given as `(path, type)`
    pub fn with_tree(mut self, full_name: &str, branch: &str, entries: &[(&str, &str)]) -> Self {
        let files = entries
            .iter()
            .map(|(path, file_type)| RepositoryFile {
                path: path.to_string(),
                file_type: file_type.to_string(),
                size: None,
            })
            .collect();
        self.trees.insert(format!("{}@{}", full_name, branch), files);
        self
    }

    /// Directory entries given as `(name, type)`
    pub fn with_directory(mut self, full_name: &str, path: &str, entries: &[(&str, &str)]) -> Self {
        let listing = entries
            .iter()
            .map(|(name, entry_type)| DirectoryEntry {
                name: name.to_string(),
                path: format!("{}/{}", path, name),
                entry_type: entry_type.to_string(),
            })
            .collect();
        self.directories
            .insert(format!("{}:{}", full_name, path), listing);
        self
    }

    pub fn with_file(mut self, full_name: &str, branch: &str, path: &str, content: &str) -> Self {
        self.files.insert(
            format!("{}@{}:{}", full_name, branch, path),
            content.to_string(),
        );
        self
    }

    /// Make `operation` on `full_name` answer with an HTTP error status
    pub fn with_failure(mut self, operation: &str, full_name: &str, status: u16) -> Self {
        self.failures
            .insert(format!("{} {}", operation, full_name), status);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded calls of one operation
    pub fn call_count(&self, operation: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.split(' ').next() == Some(operation))
            .count()
    }

    fn record(&self, operation: &str, full_name: &str, detail: &str) -> DashgenResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {} {}", operation, full_name, detail).trim_end().to_string());

        match self.failures.get(&format!("{} {}", operation, full_name)) {
            Some(status) => Err(http_error(*status, operation, full_name)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RepositoryApiClient for MockApiClient {
    async fn get_repository_metadata(
        &self,
        owner: &str,
        repo: &str,
    ) -> DashgenResult<RepositoryMetadata> {
        let full_name = format!("{}/{}", owner, repo);
        self.record("get_repository_metadata", &full_name, "")?;

        let default_branch = self
            .default_branches
            .get(&full_name)
            .cloned()
            .ok_or_else(|| http_error(404, "get_repository_metadata", &full_name))?;

        Ok(RepositoryMetadata {
            name: repo.to_string(),
            description: None,
            default_branch,
            language: None,
            private: false,
        })
    }

    async fn get_latest_commit(&self, owner: &str, repo: &str) -> DashgenResult<CommitInfo> {
        let full_name = format!("{}/{}", owner, repo);
        self.record("get_latest_commit", &full_name, "")?;

        let committed_at = self
            .commits
            .get(&full_name)
            .cloned()
            .ok_or_else(|| not_found_error!(format!("commits of {}", full_name), "mock"))?;

        Ok(CommitInfo {
            sha: "0000000".to_string(),
            committed_at,
        })
    }

    async fn get_latest_release(
        &self,
        owner: &str,
        repo: &str,
    ) -> DashgenResult<Option<ReleaseInfo>> {
        let full_name = format!("{}/{}", owner, repo);
        self.record("get_latest_release", &full_name, "")?;

        Ok(self.releases.get(&full_name).map(|tag| ReleaseInfo {
            tag_name: tag.clone(),
            name: None,
        }))
    }

    async fn branch_exists(&self, owner: &str, repo: &str, branch: &str) -> DashgenResult<bool> {
        let full_name = format!("{}/{}", owner, repo);
        self.record("branch_exists", &full_name, branch)?;

        Ok(self
            .branches
            .get(&full_name)
            .map(|branches| branches.iter().any(|b| b == branch))
            .unwrap_or(false))
    }

    async fn get_file_tree(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> DashgenResult<Vec<RepositoryFile>> {
        let full_name = format!("{}/{}", owner, repo);
        self.record("get_file_tree", &full_name, branch)?;

        let key = format!("{}@{}", full_name, branch);
        self.trees
            .get(&key)
            .cloned()
            .ok_or_else(|| http_error(404, "get_file_tree", &key))
    }

    async fn list_directory(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: Option<&str>,
    ) -> DashgenResult<Vec<DirectoryEntry>> {
        let full_name = format!("{}/{}", owner, repo);
        self.record(
            "list_directory",
            &full_name,
            &format!("{}@{}", path, git_ref.unwrap_or("")),
        )?;

        let key = format!("{}:{}", full_name, path);
        self.directories
            .get(&key)
            .cloned()
            .ok_or_else(|| http_error(404, "list_directory", &key))
    }

    async fn get_raw_file(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        path: &str,
    ) -> DashgenResult<Option<String>> {
        let full_name = format!("{}/{}", owner, repo);
        self.record("get_raw_file", &full_name, &format!("{}@{}", path, branch))?;

        Ok(self
            .files
            .get(&format!("{}@{}:{}", full_name, branch, path))
            .cloned())
    }
}
