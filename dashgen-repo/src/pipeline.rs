//! Dashboard data pipeline
//!
//! locate → fetch → scan → aggregate, run once and sequentially. Each stage
//! returns its collection; nothing is accumulated in shared state.

use std::sync::Arc;

use dashgen_core::{
    log_operation_start, log_operation_success, parse_repo_url, CategoryDescriptor, DashboardData,
    DashgenConfig, DashgenResult, ExampleRecord, RepositoryDescriptor, RepositoryRecord,
    ScanConfig,
};
use tracing::info;

use crate::aggregator::aggregate_categories;
use crate::api::{ApiClientConfig, GitHubApiClient, RepositoryApiClient};
use crate::extract::{BadgeExtractor, ExampleExtractor};
use crate::fetchers::MetadataFetcher;
use crate::scanner::ExampleScanner;

pub struct DashboardPipeline {
    client: Arc<dyn RepositoryApiClient>,
    extractor: Box<dyn ExampleExtractor>,
    scan: ScanConfig,
    web_base_url: String,
    preferred_branch: Option<String>,
}

impl DashboardPipeline {
    /// Pipeline over an arbitrary client, with the extractor the config describes
    pub fn new(
        client: Arc<dyn RepositoryApiClient>,
        config: &DashgenConfig,
    ) -> DashgenResult<Self> {
        let extractor = BadgeExtractor::from_config(&config.scan)?;

        Ok(Self {
            client,
            extractor: Box::new(extractor),
            scan: config.scan.clone(),
            web_base_url: config.api.web_base_url.clone(),
            preferred_branch: None,
        })
    }

    /// Pipeline talking to GitHub with the given token
    pub fn github(config: &DashgenConfig, access_token: Option<String>) -> DashgenResult<Self> {
        let client = GitHubApiClient::new(ApiClientConfig::from_api_config(
            &config.api,
            access_token,
        ))?;
        Self::new(Arc::new(client), config)
    }

    /// Prefer this branch wherever it exists, falling back to the default branch
    pub fn with_preferred_branch(mut self, branch: Option<String>) -> Self {
        self.preferred_branch = branch;
        self
    }

    pub fn with_extractor(mut self, extractor: Box<dyn ExampleExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Every descriptor must be usable before the first request goes out
    fn validate_descriptors(descriptors: &[RepositoryDescriptor]) -> DashgenResult<()> {
        descriptors.iter().try_for_each(RepositoryDescriptor::validate)
    }

    fn fetcher(&self) -> MetadataFetcher<'_> {
        MetadataFetcher::new(self.client.as_ref(), &self.scan)
    }

    /// One record per descriptor, in input order
    pub async fn collect_repositories(
        &self,
        descriptors: &[RepositoryDescriptor],
    ) -> DashgenResult<Vec<RepositoryRecord>> {
        Self::validate_descriptors(descriptors)?;

        let fetcher = self.fetcher();
        let mut records = Vec::with_capacity(descriptors.len());

        for (no, descriptor) in descriptors.iter().enumerate() {
            let repo = parse_repo_url(&descriptor.url)?;
            let source = descriptor.example_source()?;
            info!(repo = %repo, "Collecting repository metadata");

            let branch = fetcher
                .resolve_branch(&repo, self.preferred_branch.as_deref())
                .await?;
            let num_examples = fetcher.count_examples(&repo, &source, &branch).await?;
            let last_update = fetcher.last_update(&repo).await?;
            let release_ver = fetcher.latest_release(&repo).await?;

            records.push(RepositoryRecord {
                no,
                repo_name: descriptor.name.clone(),
                repo_url: descriptor.url.clone(),
                tech: descriptor.tech.clone(),
                num_examples,
                last_update,
                release_ver,
            });
        }

        Ok(records)
    }

    pub async fn scan_examples(
        &self,
        descriptors: &[RepositoryDescriptor],
    ) -> DashgenResult<Vec<ExampleRecord>> {
        Self::validate_descriptors(descriptors)?;

        ExampleScanner::new(
            self.client.as_ref(),
            &self.scan,
            self.extractor.as_ref(),
            &self.web_base_url,
        )
        .scan_all(descriptors, self.preferred_branch.as_deref())
        .await
    }

    /// Run every stage and return the data the report is rendered from
    pub async fn run(
        &self,
        descriptors: &[RepositoryDescriptor],
        catalog: &[CategoryDescriptor],
    ) -> DashgenResult<DashboardData> {
        log_operation_start!("collect_dashboard_data", repositories = descriptors.len());

        let repositories = self.collect_repositories(descriptors).await?;
        let examples = self.scan_examples(descriptors).await?;
        let applications = aggregate_categories(&examples, catalog);

        log_operation_success!("collect_dashboard_data",
            repositories = repositories.len(),
            examples = examples.len(),
            applications = applications.len()
        );

        Ok(DashboardData {
            repositories,
            examples,
            applications,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockApiClient;
    use chrono::NaiveDate;
    use dashgen_core::{Rank, NOT_CHECK};

    fn descriptors() -> Vec<RepositoryDescriptor> {
        vec![
            RepositoryDescriptor {
                url: "https://github.com/octo/apps".to_string(),
                name: "Zigbee Applications".to_string(),
                tech: "Zigbee".to_string(),
                examples_folder: "application".to_string(),
                extension: None,
            },
            RepositoryDescriptor {
                url: "https://github.com/octo/sdk".to_string(),
                name: "Peripheral SDK".to_string(),
                tech: "C".to_string(),
                examples_folder: NOT_CHECK.to_string(),
                extension: Some("c".to_string()),
            },
        ]
    }

    fn catalog() -> Vec<CategoryDescriptor> {
        vec![
            CategoryDescriptor {
                app_type: "Sensing".to_string(),
                mm_rank: Rank::Number(1),
            },
            CategoryDescriptor {
                app_type: "Actuation".to_string(),
                mm_rank: Rank::Number(2),
            },
        ]
    }

    fn client() -> MockApiClient {
        MockApiClient::new()
            .with_repo("octo/apps", "main", "2024-03-11T10:22:00Z")
            .with_release("octo/apps", "v1.4.0")
            .with_directory(
                "octo/apps",
                "application",
                &[("sensor", "dir"), ("light", "dir"), ("deprecated", "dir")],
            )
            .with_file(
                "octo/apps",
                "main",
                "application/sensor/README.md",
                "# Sensor\n![Type badge](https://img.shields.io/badge/Sensing-salmon)\n",
            )
            .with_file(
                "octo/apps",
                "main",
                "application/light/README.md",
                "# Light\n![Type badge](https://img.shields.io/badge/Sensing-salmon)\n\
                 ![Type badge](https://img.shields.io/badge/Actuation-salmon)\n",
            )
            .with_repo("octo/sdk", "develop", "2023-12-31T23:30:00+02:00")
            .with_tree(
                "octo/sdk",
                "develop",
                &[("a.c", "blob"), ("b.c", "blob"), ("a.h", "blob")],
            )
    }

    #[tokio::test]
    async fn test_end_to_end() {
        let client = Arc::new(client());
        let pipeline = DashboardPipeline::new(client.clone(), &DashgenConfig::default()).unwrap();

        let data = pipeline.run(&descriptors(), &catalog()).await.unwrap();

        assert_eq!(data.repositories.len(), 2);
        let apps = &data.repositories[0];
        assert_eq!(apps.no, 0);
        assert_eq!(apps.repo_name, "Zigbee Applications");
        assert_eq!(apps.num_examples, Some(2));
        assert_eq!(apps.last_update, NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());
        assert_eq!(apps.release_ver, "v1.4.0");

        let sdk = &data.repositories[1];
        assert_eq!(sdk.no, 1);
        assert_eq!(sdk.num_examples, Some(2));
        assert_eq!(sdk.last_update, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
        assert_eq!(sdk.release_ver, "");

        assert_eq!(data.examples.len(), 3);
        assert_eq!(data.applications[0].no_examples, 2);
        assert_eq!(data.applications[1].no_examples, 1);

        // The sdk is counted from its tree and never listed or scanned
        assert!(!client
            .calls()
            .iter()
            .any(|call| call.starts_with("list_directory octo/sdk")));
        assert_eq!(client.call_count("get_file_tree"), 1);
    }

    #[tokio::test]
    async fn test_fatal_fetch_failure_aborts_run() {
        let client = Arc::new(client().with_failure("get_latest_commit", "octo/sdk", 500));
        let pipeline = DashboardPipeline::new(client, &DashgenConfig::default()).unwrap();

        let err = pipeline.run(&descriptors(), &catalog()).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn test_preferred_branch_is_checked_per_repository() {
        let client = Arc::new(
            client()
                .with_branch("octo/apps", "staging")
                .with_directory("octo/apps", "application", &[])
                .with_file("octo/apps", "staging", "templates.xml", "a.slcp"),
        );
        let pipeline = DashboardPipeline::new(client.clone(), &DashgenConfig::default())
            .unwrap()
            .with_preferred_branch(Some("staging".to_string()));

        let records = pipeline.collect_repositories(&descriptors()).await.unwrap();
        assert_eq!(records[0].num_examples, Some(1));
        assert_eq!(records[1].num_examples, Some(2));
        assert_eq!(client.call_count("branch_exists"), 2);
    }

    #[tokio::test]
    async fn test_malformed_url_is_rejected_before_any_request() {
        let client = Arc::new(MockApiClient::new());
        let pipeline = DashboardPipeline::new(client.clone(), &DashgenConfig::default()).unwrap();

        let mut broken = descriptors();
        broken[0].url = "github.com/octo".to_string();

        assert!(pipeline.collect_repositories(&broken).await.is_err());
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_later_url_is_rejected_before_any_request() {
        let client = Arc::new(client());
        let pipeline = DashboardPipeline::new(client.clone(), &DashgenConfig::default()).unwrap();

        let mut broken = descriptors();
        broken[1].url = "github.com/broken".to_string();

        let err = pipeline.run(&broken, &catalog()).await.unwrap_err();
        assert!(matches!(err, dashgen_core::DashgenError::Validation { .. }));
        assert!(client.calls().is_empty());

        assert!(pipeline.scan_examples(&broken).await.is_err());
        assert!(client.calls().is_empty());
    }
}
