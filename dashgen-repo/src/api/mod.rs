//! API clients for accessing remote repositories
//!
//! The dashboard only reads from the hosting platform, so the client surface is
//! a handful of GET endpoints behind [`RepositoryApiClient`]. Fetch logic talks
//! to the trait, which lets tests substitute an in-memory client.

use async_trait::async_trait;
use dashgen_core::{ApiConfig, DashgenError, DashgenResult, ErrorContext};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod github;

#[cfg(test)]
pub(crate) mod mock;


pub use github::GitHubApiClient;

/// An entry of a recursive git tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryFile {
    /// File path relative to repository root
    pub path: String,
    /// Entry type (blob, tree, commit)
    pub file_type: String,
    /// File size in bytes (if available)
    pub size: Option<u64>,
}

impl RepositoryFile {
    pub fn is_blob(&self) -> bool {
        self.file_type == "blob"
    }
}

/// An entry of a single directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub name: String,
    pub path: String,
    /// `dir`, `file`, `symlink` or `submodule`
    pub entry_type: String,
}

impl DirectoryEntry {
    pub fn is_dir(&self) -> bool {
        self.entry_type == "dir"
    }
}

/// Repository metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryMetadata {
    pub name: String,
    pub description: Option<String>,
    pub default_branch: String,
    pub language: Option<String>,
    pub private: bool,
}

/// Most recent commit of the default branch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitInfo {
    pub sha: String,
    /// Committer timestamp exactly as returned by the API (RFC 3339)
    pub committed_at: String,
}

/// Latest published release
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseInfo {
    pub tag_name: String,
    pub name: Option<String>,
}

/// Configuration for API clients
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL for the REST API
    pub base_url: String,
    /// Base URL of the raw content host
    pub raw_base_url: String,
    /// Access token for authentication
    pub access_token: Option<String>,
    /// Request timeout in seconds; `None` keeps the client default
    pub timeout_seconds: Option<u64>,
    /// User agent string
    pub user_agent: String,
    /// Additional headers
    pub headers: HashMap<String, String>,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            raw_base_url: String::new(),
            access_token: None,
            timeout_seconds: None,
            user_agent: format!("dashgen/{}", env!("CARGO_PKG_VERSION")),
            headers: HashMap::new(),
        }
    }
}

impl ApiClientConfig {
    /// Create a new configuration for github.com
    pub fn github(access_token: Option<String>) -> Self {
        Self {
            base_url: "https://api.github.com".to_string(),
            raw_base_url: "https://raw.githubusercontent.com".to_string(),
            access_token,
            ..Default::default()
        }
    }

    /// Build from the `[api]` section of the configuration file
    pub fn from_api_config(api: &ApiConfig, access_token: Option<String>) -> Self {
        Self {
            base_url: api.base_url.clone(),
            raw_base_url: api.raw_base_url.clone(),
            access_token,
            timeout_seconds: api.timeout_seconds,
            user_agent: api.user_agent.clone(),
            headers: HashMap::new(),
        }
    }

    /// Set additional header
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = Some(timeout_seconds);
        self
    }
}

/// Read-only access to a hosting platform
#[async_trait]
pub trait RepositoryApiClient: Send + Sync {
    /// Get repository metadata
    async fn get_repository_metadata(
        &self,
        owner: &str,
        repo: &str,
    ) -> DashgenResult<RepositoryMetadata>;

    /// Get the most recent commit (page size 1)
    async fn get_latest_commit(&self, owner: &str, repo: &str) -> DashgenResult<CommitInfo>;

    /// Get the latest release; `None` when the repository has no release (404)
    async fn get_latest_release(
        &self,
        owner: &str,
        repo: &str,
    ) -> DashgenResult<Option<ReleaseInfo>>;

    /// Whether `branch` exists. Not-found is `false`; every other failure is an error.
    async fn branch_exists(&self, owner: &str, repo: &str, branch: &str) -> DashgenResult<bool>;

    /// Get the complete recursive tree of a branch, all entry types included
    async fn get_file_tree(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> DashgenResult<Vec<RepositoryFile>>;

    /// List the immediate entries of a directory
    async fn list_directory(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: Option<&str>,
    ) -> DashgenResult<Vec<DirectoryEntry>>;

    /// Get the raw contents of a file; `None` when the file does not exist (404)
    async fn get_raw_file(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        path: &str,
    ) -> DashgenResult<Option<String>>;

    /// Get the default branch name
    async fn get_default_branch(&self, owner: &str, repo: &str) -> DashgenResult<String> {
        let metadata = self.get_repository_metadata(owner, repo).await?;
        Ok(metadata.default_branch)
    }
}

/// Helper function to create HTTP client with common configuration
pub(crate) fn create_http_client(config: &ApiClientConfig) -> DashgenResult<reqwest::Client> {
    let mut headers = reqwest::header::HeaderMap::new();

    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_str(&config.user_agent).map_err(|e| {
            DashgenError::Config {
                message: format!("Invalid user agent: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            }
        })?,
    );

    for (key, value) in &config.headers {
        let header_name = reqwest::header::HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
            DashgenError::Config {
                message: format!("Invalid header name '{}': {}", key, e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            }
        })?;

        let header_value =
            reqwest::header::HeaderValue::from_str(value).map_err(|e| DashgenError::Config {
                message: format!("Invalid header value for '{}': {}", key, e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            })?;

        headers.insert(header_name, header_value);
    }

    let mut builder = reqwest::Client::builder().default_headers(headers);
    if let Some(timeout) = config.timeout_seconds {
        builder = builder.timeout(std::time::Duration::from_secs(timeout));
    }

    builder.build().map_err(|e| DashgenError::Config {
        message: format!("Failed to create HTTP client: {}", e),
        source: Some(Box::new(e)),
        context: ErrorContext::new("http_client").with_operation("create_client"),
    })
}

/// Helper function to turn a non-success HTTP response into an error
pub(crate) async fn handle_response_error(
    response: reqwest::Response,
    operation: &str,
) -> DashgenError {
    let status = response.status();
    let url = response.url().to_string();

    let error_body = response.text().await.unwrap_or_default();

    DashgenError::Repository {
        message: format!(
            "HTTP {} error for {}: {}",
            status.as_u16(),
            url,
            if error_body.is_empty() {
                status.canonical_reason().unwrap_or("Unknown error")
            } else {
                &error_body
            }
        ),
        status: Some(status.as_u16()),
        source: None,
        context: ErrorContext::new("api_client")
            .with_operation(operation)
            .with_metadata("url", &url)
            .with_suggestion(match status.as_u16() {
                401 => "Check your access token",
                403 => "Check repository permissions or rate limits",
                404 => "Repository, branch or path not found or not accessible",
                _ => "Check network connectivity and API status",
            }),
    }
}
