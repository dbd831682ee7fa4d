//! Per-repository metadata fetchers
//!
//! Each operation issues the API calls for one piece of dashboard data and
//! normalizes the answer. Failures propagate, except the release lookup which
//! degrades to an empty tag.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate};
use dashgen_core::{repository_error, DashgenResult, ExampleSource, RepoLocator, ScanConfig};
use tracing::{debug, info, warn};

use crate::api::{RepositoryApiClient, RepositoryFile};

/// Calendar date of an RFC 3339 timestamp, in the timestamp's own offset
pub fn commit_date(timestamp: &str) -> DashgenResult<NaiveDate> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|datetime| datetime.date_naive())
        .map_err(|e| {
            repository_error!(
                format!("Invalid commit timestamp '{}': {}", timestamp, e),
                "fetchers",
                e
            )
        })
}

/// Count blob entries per extension (text after the last `.` of the path)
pub fn tally_extensions(files: &[RepositoryFile]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for file in files.iter().filter(|f| f.is_blob()) {
        if let Some((_, extension)) = file.path.rsplit_once('.') {
            *counts.entry(extension.to_string()).or_insert(0) += 1;
        }
    }
    counts
}

/// Non-overlapping occurrences of `marker` in a manifest
pub fn count_marker(content: &str, marker: &str) -> usize {
    if marker.is_empty() {
        return 0;
    }
    content.matches(marker).count()
}

/// `folder/name`, tolerating an empty or slash-terminated folder
pub(crate) fn join_path(folder: &str, name: &str) -> String {
    let folder = folder.trim_matches('/');
    if folder.is_empty() || folder == "." {
        name.to_string()
    } else {
        format!("{}/{}", folder, name)
    }
}

/// Fetches dashboard metadata through a [`RepositoryApiClient`]
pub struct MetadataFetcher<'a> {
    client: &'a dyn RepositoryApiClient,
    scan: &'a ScanConfig,
}

impl<'a> MetadataFetcher<'a> {
    pub fn new(client: &'a dyn RepositoryApiClient, scan: &'a ScanConfig) -> Self {
        Self { client, scan }
    }

    /// Date of the most recent commit
    pub async fn last_update(&self, repo: &RepoLocator) -> DashgenResult<NaiveDate> {
        let commit = self
            .client
            .get_latest_commit(&repo.owner, &repo.name)
            .await?;
        let date = commit_date(&commit.committed_at)?;
        debug!(repo = %repo, date = %date, "Latest update");
        Ok(date)
    }

    /// Tag of the latest release, or an empty string when there is none.
    ///
    /// An HTTP error status is logged and degrades to an empty tag; a request
    /// that got no response at all is still an error.
    pub async fn latest_release(&self, repo: &RepoLocator) -> DashgenResult<String> {
        match self
            .client
            .get_latest_release(&repo.owner, &repo.name)
            .await
        {
            Ok(Some(release)) => Ok(release.tag_name),
            Ok(None) => {
                warn!(repo = %repo, "No release published");
                Ok(String::new())
            }
            Err(e) if e.status().is_some() => {
                warn!(repo = %repo, error = %e, "Could not get latest release");
                Ok(String::new())
            }
            Err(e) => Err(e),
        }
    }

    pub async fn default_branch(&self, repo: &RepoLocator) -> DashgenResult<String> {
        self.client.get_default_branch(&repo.owner, &repo.name).await
    }

    /// The preferred branch when it exists in the repository, else the default branch
    pub async fn resolve_branch(
        &self,
        repo: &RepoLocator,
        preferred: Option<&str>,
    ) -> DashgenResult<String> {
        if let Some(branch) = preferred {
            if self
                .client
                .branch_exists(&repo.owner, &repo.name, branch)
                .await?
            {
                return Ok(branch.to_string());
            }
            debug!(repo = %repo, branch, "Preferred branch missing, using default branch");
        }

        self.default_branch(repo).await
    }

    /// Number of files with `extension` on `branch`; `None` when it never occurs
    pub async fn count_extension(
        &self,
        repo: &RepoLocator,
        branch: &str,
        extension: &str,
    ) -> DashgenResult<Option<usize>> {
        let files = self
            .client
            .get_file_tree(&repo.owner, &repo.name, branch)
            .await?;
        let count = tally_extensions(&files).get(extension).copied();
        debug!(repo = %repo, extension, count = ?count, "Counted files by extension");
        Ok(count)
    }

    /// Example count from the repository manifest; `None` when the manifest is absent
    pub async fn count_manifest_examples(
        &self,
        repo: &RepoLocator,
        branch: &str,
    ) -> DashgenResult<Option<usize>> {
        let manifest = self.scan.manifest.file_for(&repo.name);
        let content = self
            .client
            .get_raw_file(&repo.owner, &repo.name, branch, manifest)
            .await?;

        Ok(content.map(|content| {
            let count = count_marker(&content, &self.scan.manifest.marker);
            debug!(repo = %repo, manifest, count, "Counted manifest entries");
            count
        }))
    }

    /// Names of the example subfolders of `folder`, excluded names removed
    pub async fn list_example_folders(
        &self,
        repo: &RepoLocator,
        folder: &str,
        branch: &str,
    ) -> DashgenResult<Vec<String>> {
        let entries = self
            .client
            .list_directory(&repo.owner, &repo.name, folder, Some(branch))
            .await?;

        Ok(entries
            .into_iter()
            .filter(|entry| entry.is_dir() && !self.scan.is_excluded(&entry.name))
            .map(|entry| entry.name)
            .collect())
    }

    /// Example count for a repository, using the strategy its descriptor selects
    pub async fn count_examples(
        &self,
        repo: &RepoLocator,
        source: &ExampleSource<'_>,
        branch: &str,
    ) -> DashgenResult<Option<usize>> {
        match source {
            ExampleSource::Extension(extension) => {
                self.count_extension(repo, branch, extension).await
            }
            ExampleSource::Folder(folder) => {
                if let Some(count) = self.count_manifest_examples(repo, branch).await? {
                    return Ok(Some(count));
                }
                let folders = self.list_example_folders(repo, folder, branch).await?;
                info!(repo = %repo, folder, count = folders.len(), "Counted example folders");
                Ok(Some(folders.len()))
            }
        }
    }
}
