//! Repository URL parsing

use crate::error::{DashgenError, DashgenResult, ErrorContext};
use crate::types::RepoLocator;
use url::Url;

/// Parse `https://<host>/<owner>/<repo>` into owner and repository name.
///
/// Anything after the repository segment (`/tree/main`, `/blob/...`) is ignored
/// and a trailing `.git` is stripped.
pub fn parse_repo_url(repo_url: &str) -> DashgenResult<RepoLocator> {
    let parsed_url = Url::parse(repo_url).map_err(|e| DashgenError::Validation {
        message: format!("Invalid repository URL '{}': {}", repo_url, e),
        field: Some("url".to_string()),
        context: ErrorContext::new("locator")
            .with_operation("parse_repo_url")
            .with_suggestion("Ensure the URL is valid and properly formatted"),
    })?;

    let segments: Vec<&str> = parsed_url
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    match segments.as_slice() {
        [owner, name, ..] => Ok(RepoLocator {
            owner: owner.to_string(),
            name: name.trim_end_matches(".git").to_string(),
        }),
        _ => Err(crate::validation_error!(
            format!(
                "Repository URL must contain owner and repository name: '{}'",
                repo_url
            ),
            "url",
            "locator",
            suggestion = "URL should be in format: https://github.com/owner/repo"
        )),
    }
}
