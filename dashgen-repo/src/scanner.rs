//! Example scanner
//!
//! Walks the example folders of repositories that follow the documentation
//! convention and turns each publishable README into [`ExampleRecord`]s, one
//! per category badge. A folder whose README is missing, carries no category
//! badge, or has no level-one heading is skipped; it never aborts the run.

use dashgen_core::{
    parse_repo_url, DashgenResult, ExampleRecord, RepoLocator, RepositoryDescriptor, ScanConfig,
};
use tracing::{debug, info, warn};

use crate::api::RepositoryApiClient;
use crate::extract::ExampleExtractor;
use crate::fetchers::{join_path, MetadataFetcher};

pub struct ExampleScanner<'a> {
    client: &'a dyn RepositoryApiClient,
    scan: &'a ScanConfig,
    extractor: &'a dyn ExampleExtractor,
    web_base_url: &'a str,
}

impl<'a> ExampleScanner<'a> {
    pub fn new(
        client: &'a dyn RepositoryApiClient,
        scan: &'a ScanConfig,
        extractor: &'a dyn ExampleExtractor,
        web_base_url: &'a str,
    ) -> Self {
        Self {
            client,
            scan,
            extractor,
            web_base_url,
        }
    }

    /// Scan every descriptor that follows the convention, in input order
    pub async fn scan_all(
        &self,
        descriptors: &[RepositoryDescriptor],
        preferred_branch: Option<&str>,
    ) -> DashgenResult<Vec<ExampleRecord>> {
        let mut examples = Vec::new();
        for descriptor in descriptors {
            examples.extend(self.scan_repository(descriptor, preferred_branch).await?);
        }
        Ok(examples)
    }

    /// Examples of one repository; empty for `not_check` descriptors
    pub async fn scan_repository(
        &self,
        descriptor: &RepositoryDescriptor,
        preferred_branch: Option<&str>,
    ) -> DashgenResult<Vec<ExampleRecord>> {
        if !descriptor.follows_convention() {
            debug!(repo = %descriptor.name, "Repository does not follow the example convention");
            return Ok(Vec::new());
        }

        let repo = parse_repo_url(&descriptor.url)?;
        let fetcher = MetadataFetcher::new(self.client, self.scan);
        let branch = fetcher.resolve_branch(&repo, preferred_branch).await?;
        info!(repo = %repo, branch = %branch, "Scanning examples");

        let folders = fetcher
            .list_example_folders(&repo, &descriptor.examples_folder, &branch)
            .await?;
        info!(repo = %repo, total = folders.len(), "Example folders found");

        let mut examples = Vec::new();
        for folder in folders {
            let folder_path = join_path(&descriptor.examples_folder, &folder);
            examples.extend(self.scan_folder(&repo, &branch, &folder_path).await?);
        }

        Ok(examples)
    }

    /// Records for a single example folder; empty when the folder is not publishable
    pub async fn scan_folder(
        &self,
        repo: &RepoLocator,
        branch: &str,
        folder_path: &str,
    ) -> DashgenResult<Vec<ExampleRecord>> {
        let readme_path = join_path(folder_path, &self.scan.readme_file);
        let Some(readme) = self
            .client
            .get_raw_file(&repo.owner, &repo.name, branch, &readme_path)
            .await?
        else {
            warn!(
                repo = %repo,
                folder = folder_path,
                "No {} found, skipping",
                self.scan.readme_file
            );
            return Ok(Vec::new());
        };

        let labels = self.extractor.category_labels(&readme);
        if labels.is_empty() {
            debug!(repo = %repo, folder = folder_path, "No category badge, skipping");
            return Ok(Vec::new());
        }

        let Some(title) = self.extractor.title(&readme) else {
            warn!(repo = %repo, folder = folder_path, "No level-one heading, skipping");
            return Ok(Vec::new());
        };

        let example_url = format!(
            "{}/{}/blob/{}/{}",
            self.web_base_url.trim_end_matches('/'),
            repo.full_name(),
            branch,
            readme_path
        );

        Ok(labels
            .into_iter()
            .map(|app_type| ExampleRecord {
                example_name: title.clone(),
                example_url: example_url.clone(),
                app_type,
            })
            .collect())
    }
}
