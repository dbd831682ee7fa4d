//! GitHub API client implementation

use async_trait::async_trait;
use dashgen_core::{DashgenError, DashgenResult, ErrorContext};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{
    create_http_client, handle_response_error, ApiClientConfig, CommitInfo, DirectoryEntry,
    ReleaseInfo, RepositoryApiClient, RepositoryFile, RepositoryMetadata,
};

const JSON_MEDIA_TYPE: &str = "application/vnd.github.v3+json";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.v3.raw";

/// GitHub API client
pub struct GitHubApiClient {
    client: reqwest::Client,
    config: ApiClientConfig,
}

/// GitHub repository response
#[derive(Debug, Deserialize)]
struct GitHubRepository {
    name: String,
    description: Option<String>,
    default_branch: String,
    language: Option<String>,
    private: bool,
}

/// GitHub commit list item
#[derive(Debug, Deserialize)]
struct GitHubCommitItem {
    sha: String,
    commit: GitHubCommit,
}

#[derive(Debug, Deserialize)]
struct GitHubCommit {
    committer: GitHubSignature,
}

#[derive(Debug, Deserialize)]
struct GitHubSignature {
    date: String,
}

/// GitHub release response
#[derive(Debug, Deserialize)]
struct GitHubRelease {
    tag_name: String,
    name: Option<String>,
}

/// GitHub tree response
#[derive(Debug, Deserialize)]
struct GitHubTreeResponse {
    #[serde(default)]
    tree: Vec<GitHubTreeItem>,
    truncated: Option<bool>,
}

/// GitHub tree item
#[derive(Debug, Deserialize)]
struct GitHubTreeItem {
    path: String,
    #[serde(rename = "type")]
    item_type: String,
    size: Option<u64>,
}

/// GitHub contents listing item
#[derive(Debug, Deserialize)]
struct GitHubContentItem {
    name: String,
    path: String,
    #[serde(rename = "type")]
    item_type: String,
}

/// How a response status maps onto a resource that may legitimately not exist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Presence {
    Found,
    Missing,
    Failed,
}

fn presence(status: StatusCode) -> Presence {
    if status.is_success() {
        Presence::Found
    } else if status == StatusCode::NOT_FOUND {
        Presence::Missing
    } else {
        Presence::Failed
    }
}

/// Newest commit of a `commits?per_page=1` listing
fn latest_commit(
    commits: Vec<GitHubCommitItem>,
    owner: &str,
    repo: &str,
) -> DashgenResult<CommitInfo> {
    let latest = commits.into_iter().next().ok_or_else(|| DashgenError::NotFound {
        resource: format!("latest commit of {}/{}", owner, repo),
        context: ErrorContext::new("github_api_client")
            .with_operation("get_latest_commit")
            .with_suggestion("The repository has no commits"),
    })?;

    Ok(CommitInfo {
        sha: latest.sha,
        committed_at: latest.commit.committer.date,
    })
}

fn tree_files(
    tree_response: GitHubTreeResponse,
    owner: &str,
    repo: &str,
) -> Vec<RepositoryFile> {
    if tree_response.truncated.unwrap_or(false) {
        warn!("GitHub file tree was truncated for {}/{}", owner, repo);
    }

    tree_response
        .tree
        .into_iter()
        .map(|item| RepositoryFile {
            path: item.path,
            file_type: item.item_type,
            size: item.size,
        })
        .collect()
}

/// `contents/{path}` endpoint, with `.` standing for the repository root
fn contents_endpoint(owner: &str, repo: &str, path: &str, git_ref: Option<&str>) -> String {
    let path = match path.trim_matches('/') {
        "." => "",
        trimmed => trimmed,
    };
    let mut endpoint = format!("repos/{}/{}/contents/{}", owner, repo, path);
    if let Some(git_ref) = git_ref {
        endpoint.push_str(&format!("?ref={}", git_ref));
    }
    endpoint
}

impl GitHubApiClient {
    /// Create a new GitHub API client
    pub fn new(config: ApiClientConfig) -> DashgenResult<Self> {
        let client = create_http_client(&config)?;

        info!("Created GitHub API client for {}", config.base_url);

        Ok(Self { client, config })
    }

    /// Create request headers; the token is sent as a bearer credential
    fn create_headers(&self, accept: &str) -> reqwest::header::HeaderMap {
        let mut headers = reqwest::header::HeaderMap::new();

        if let Some(ref token) = self.config.access_token {
            if let Ok(auth_value) =
                reqwest::header::HeaderValue::from_str(&format!("Bearer {}", token))
            {
                headers.insert(reqwest::header::AUTHORIZATION, auth_value);
            }
        }

        if let Ok(accept_value) = reqwest::header::HeaderValue::from_str(accept) {
            headers.insert(reqwest::header::ACCEPT, accept_value);
        }

        headers
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    /// Send a GET request and return the response whatever its status
    async fn send(
        &self,
        url: &str,
        accept: &str,
        operation: &str,
    ) -> DashgenResult<reqwest::Response> {
        debug!("Making GitHub request to: {}", url);

        self.client
            .get(url)
            .headers(self.create_headers(accept))
            .send()
            .await
            .map_err(|e| DashgenError::Network {
                message: format!("Failed to make request to GitHub: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("github_api_client")
                    .with_operation(operation)
                    .with_metadata("url", url),
            })
    }

    /// Make a GET request to the GitHub API, failing on any non-success status
    async fn get_request(
        &self,
        endpoint: &str,
        operation: &str,
    ) -> DashgenResult<reqwest::Response> {
        let url = self.api_url(endpoint);
        let response = self.send(&url, JSON_MEDIA_TYPE, operation).await?;

        if !response.status().is_success() {
            return Err(handle_response_error(response, operation).await);
        }

        Ok(response)
    }

    async fn parse_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        operation: &str,
    ) -> DashgenResult<T> {
        let url = response.url().to_string();
        response.json().await.map_err(|e| DashgenError::Repository {
            message: format!("Failed to parse GitHub response: {}", e),
            status: None,
            source: Some(Box::new(e)),
            context: ErrorContext::new("github_api_client")
                .with_operation(operation)
                .with_metadata("url", &url),
        })
    }
}

#[async_trait]
impl RepositoryApiClient for GitHubApiClient {
    async fn get_repository_metadata(
        &self,
        owner: &str,
        repo: &str,
    ) -> DashgenResult<RepositoryMetadata> {
        info!("Fetching GitHub repository metadata for {}/{}", owner, repo);

        let endpoint = format!("repos/{}/{}", owner, repo);
        let response = self
            .get_request(&endpoint, "get_repository_metadata")
            .await?;
        let github_repo: GitHubRepository =
            Self::parse_json(response, "get_repository_metadata").await?;

        Ok(RepositoryMetadata {
            name: github_repo.name,
            description: github_repo.description,
            default_branch: github_repo.default_branch,
            language: github_repo.language,
            private: github_repo.private,
        })
    }

    async fn get_latest_commit(&self, owner: &str, repo: &str) -> DashgenResult<CommitInfo> {
        let endpoint = format!("repos/{}/{}/commits?per_page=1", owner, repo);
        let response = self.get_request(&endpoint, "get_latest_commit").await?;
        let commits: Vec<GitHubCommitItem> =
            Self::parse_json(response, "get_latest_commit").await?;

        latest_commit(commits, owner, repo)
    }

    async fn get_latest_release(
        &self,
        owner: &str,
        repo: &str,
    ) -> DashgenResult<Option<ReleaseInfo>> {
        let url = self.api_url(&format!("repos/{}/{}/releases/latest", owner, repo));
        let response = self
            .send(&url, JSON_MEDIA_TYPE, "get_latest_release")
            .await?;

        match presence(response.status()) {
            Presence::Found => {}
            Presence::Missing => {
                debug!("No release published for {}/{}", owner, repo);
                return Ok(None);
            }
            Presence::Failed => {
                return Err(handle_response_error(response, "get_latest_release").await)
            }
        }

        let release: GitHubRelease = Self::parse_json(response, "get_latest_release").await?;
        Ok(Some(ReleaseInfo {
            tag_name: release.tag_name,
            name: release.name,
        }))
    }

    async fn branch_exists(&self, owner: &str, repo: &str, branch: &str) -> DashgenResult<bool> {
        debug!("Checking if branch {} exists in {}/{}", branch, owner, repo);

        let url = self.api_url(&format!("repos/{}/{}/branches/{}", owner, repo, branch));
        let response = self.send(&url, JSON_MEDIA_TYPE, "branch_exists").await?;

        match presence(response.status()) {
            Presence::Found => Ok(true),
            Presence::Missing => Ok(false),
            Presence::Failed => Err(handle_response_error(response, "branch_exists").await),
        }
    }

    async fn get_file_tree(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> DashgenResult<Vec<RepositoryFile>> {
        info!(
            "Fetching GitHub file tree for {}/{} (branch: {})",
            owner, repo, branch
        );

        let endpoint = format!("repos/{}/{}/git/trees/{}?recursive=1", owner, repo, branch);
        let response = self.get_request(&endpoint, "get_file_tree").await?;
        let tree_response: GitHubTreeResponse =
            Self::parse_json(response, "get_file_tree").await?;

        Ok(tree_files(tree_response, owner, repo))
    }

    async fn list_directory(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: Option<&str>,
    ) -> DashgenResult<Vec<DirectoryEntry>> {
        debug!("Listing {}/{}/{}", owner, repo, path);

        let endpoint = contents_endpoint(owner, repo, path, git_ref);

        let response = self.get_request(&endpoint, "list_directory").await?;
        let items: Vec<GitHubContentItem> = Self::parse_json(response, "list_directory").await?;

        Ok(items
            .into_iter()
            .map(|item| DirectoryEntry {
                name: item.name,
                path: item.path,
                entry_type: item.item_type,
            })
            .collect())
    }

    async fn get_raw_file(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        path: &str,
    ) -> DashgenResult<Option<String>> {
        let url = format!(
            "{}/{}/{}/{}/{}",
            self.config.raw_base_url.trim_end_matches('/'),
            owner,
            repo,
            branch,
            path.trim_start_matches('/')
        );
        let response = self.send(&url, RAW_MEDIA_TYPE, "get_raw_file").await?;

        match presence(response.status()) {
            Presence::Found => {}
            Presence::Missing => {
                debug!("File not found: {}", url);
                return Ok(None);
            }
            Presence::Failed => return Err(handle_response_error(response, "get_raw_file").await),
        }

        let content = response.text().await.map_err(|e| DashgenError::Network {
            message: format!("Failed to read file body: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("github_api_client")
                .with_operation("get_raw_file")
                .with_metadata("url", &url),
        })?;

        Ok(Some(content))
    }
}
