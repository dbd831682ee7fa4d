//! Dashboard rendering
//!
//! Turns [`DashboardData`] into a single static HTML page using Askama.

use std::path::Path;

use askama::Template;
use chrono::{DateTime, Utc};
use dashgen_core::{DashboardData, DashgenError, DashgenResult, ErrorContext};

/// Dashboard page template
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub title: String,
    pub generated_at: String,
    pub repositories: Vec<RepositoryRow>,
    pub applications: Vec<ApplicationRow>,
    pub examples: Vec<ExampleRow>,
}

/// Repository row for templates
pub struct RepositoryRow {
    pub no: usize,
    pub name: String,
    pub url: String,
    pub tech: String,
    pub num_examples: String,
    pub last_update: String,
    pub release: String,
}

/// Application category row for templates
pub struct ApplicationRow {
    pub app_type: String,
    pub rank: String,
    pub no_examples: usize,
}

/// Example row for templates
pub struct ExampleRow {
    pub name: String,
    pub url: String,
    pub app_type: String,
}

impl DashboardTemplate {
    pub fn new(title: &str, data: &DashboardData, generated_at: DateTime<Utc>) -> Self {
        let repositories = data
            .repositories
            .iter()
            .map(|repo| RepositoryRow {
                no: repo.no,
                name: repo.repo_name.clone(),
                url: repo.repo_url.clone(),
                tech: repo.tech.clone(),
                num_examples: repo
                    .num_examples
                    .map(|count| count.to_string())
                    .unwrap_or_default(),
                last_update: repo.last_update.format("%Y-%m-%d").to_string(),
                release: repo.release_ver.clone(),
            })
            .collect();

        // Catalog order is kept in the data; the page lists categories by rank
        let mut ranked: Vec<_> = data.applications.iter().collect();
        ranked.sort_by(|a, b| a.rank.sort_cmp(&b.rank));
        let applications = ranked
            .into_iter()
            .map(|app| ApplicationRow {
                app_type: app.app_type.clone(),
                rank: app.rank.to_string(),
                no_examples: app.no_examples,
            })
            .collect();

        let examples = data
            .examples
            .iter()
            .map(|example| ExampleRow {
                name: example.example_name.clone(),
                url: example.example_url.clone(),
                app_type: example.app_type.clone(),
            })
            .collect();

        Self {
            title: title.to_string(),
            generated_at: generated_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            repositories,
            applications,
            examples,
        }
    }
}

/// Render the dashboard page to HTML
pub fn render_dashboard(
    title: &str,
    data: &DashboardData,
    generated_at: DateTime<Utc>,
) -> DashgenResult<String> {
    DashboardTemplate::new(title, data, generated_at)
        .render()
        .map_err(|e| DashgenError::Render {
            message: format!("Failed to render dashboard: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("report").with_operation("render_dashboard"),
        })
}

/// Write the rendered page, creating missing parent directories
pub async fn write_dashboard(path: &Path, html: &str) -> DashgenResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, html).await?;
    Ok(())
}
