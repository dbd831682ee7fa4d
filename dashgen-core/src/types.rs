//! Core data type definitions

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::Path;

use crate::error::{DashgenError, DashgenResult, ErrorContext};
use crate::locator::parse_repo_url;

/// `examples_folder` value marking a repository that does not follow the
/// example documentation convention
pub const NOT_CHECK: &str = "not_check";

/// Repository descriptor as stored in the repositories JSON file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryDescriptor {
    pub url: String,
    pub name: String,
    pub tech: String,
    pub examples_folder: String,
    /// Only meaningful when `examples_folder` is `not_check`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
}

/// How a repository's examples are located
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExampleSource<'a> {
    /// Repository follows the convention; examples live under this folder
    Folder(&'a str),
    /// Repository is counted by file extension instead
    Extension(&'a str),
}

impl RepositoryDescriptor {
    /// Whether the repository follows the example documentation convention
    pub fn follows_convention(&self) -> bool {
        self.examples_folder != NOT_CHECK
    }

    /// Check the URL and the example source without touching the network
    pub fn validate(&self) -> DashgenResult<()> {
        parse_repo_url(&self.url)?;
        self.example_source()?;
        Ok(())
    }

    /// Resolve the example source, failing when a `not_check` entry has no extension
    pub fn example_source(&self) -> DashgenResult<ExampleSource<'_>> {
        if self.follows_convention() {
            return Ok(ExampleSource::Folder(&self.examples_folder));
        }

        match self.extension.as_deref() {
            Some(ext) if !ext.is_empty() => Ok(ExampleSource::Extension(ext)),
            _ => Err(crate::validation_error!(
                format!(
                    "Repository '{}' ({}) is marked {} but has no extension",
                    self.name, self.url, NOT_CHECK
                ),
                "extension",
                "repository_descriptor",
                suggestion = "Add an \"extension\" field such as \"c\" or \"py\""
            )),
        }
    }
}

/// Category descriptor as stored in the categories JSON file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDescriptor {
    pub app_type: String,
    #[serde(default)]
    pub mm_rank: Rank,
}

/// Externally supplied ordering key, passed through as the catalog gives it
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rank {
    Number(i64),
    Float(f64),
    Text(String),
    /// `null` or missing in the catalog
    #[default]
    Unranked,
}

impl Rank {
    fn class(&self) -> u8 {
        match self {
            Rank::Number(_) | Rank::Float(_) => 0,
            Rank::Text(_) => 1,
            Rank::Unranked => 2,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Rank::Number(n) => Some(*n as f64),
            Rank::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Numbers first in numeric order, then text, then unranked entries
    pub fn sort_cmp(&self, other: &Rank) -> Ordering {
        match (self, other) {
            (Rank::Number(a), Rank::Number(b)) => a.cmp(b),
            (Rank::Text(a), Rank::Text(b)) => a.cmp(b),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                _ => self.class().cmp(&other.class()),
            },
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rank::Number(n) => write!(f, "{}", n),
            Rank::Float(x) => write!(f, "{}", x),
            Rank::Text(s) => f.write_str(s),
            Rank::Unranked => Ok(()),
        }
    }
}

/// Owner and name of a hosted repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoLocator {
    pub owner: String,
    pub name: String,
}

impl RepoLocator {
    /// `owner/name`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// One row of the repositories table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    pub no: usize,
    pub repo_name: String,
    pub repo_url: String,
    pub tech: String,
    /// Absent when the requested extension never occurs in the tree
    pub num_examples: Option<usize>,
    pub last_update: NaiveDate,
    /// Empty when the repository has no release yet
    pub release_ver: String,
}

/// A published example discovered in a repository following the convention
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleRecord {
    pub example_name: String,
    pub example_url: String,
    pub app_type: String,
}

/// A catalog category with its computed example count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationCategory {
    #[serde(rename = "type")]
    pub app_type: String,
    pub rank: Rank,
    pub no_examples: usize,
}

/// Everything the report renderer consumes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardData {
    pub repositories: Vec<RepositoryRecord>,
    pub examples: Vec<ExampleRecord>,
    pub applications: Vec<ApplicationCategory>,
}

/// Load the repositories JSON file, rejecting malformed URLs and
/// `not_check` entries without an extension
pub fn load_repository_descriptors<P: AsRef<Path>>(
    path: P,
) -> DashgenResult<Vec<RepositoryDescriptor>> {
    let descriptors: Vec<RepositoryDescriptor> = load_json(path.as_ref(), "load_repositories")?;

    for descriptor in &descriptors {
        descriptor.validate()?;
    }

    Ok(descriptors)
}

/// Load the categories JSON file
pub fn load_category_descriptors<P: AsRef<Path>>(
    path: P,
) -> DashgenResult<Vec<CategoryDescriptor>> {
    load_json(path.as_ref(), "load_categories")
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path, operation: &str) -> DashgenResult<T> {
    let content = std::fs::read_to_string(path).map_err(|e| DashgenError::Config {
        message: format!("Failed to read {}: {}", path.display(), e),
        source: Some(Box::new(e)),
        context: ErrorContext::new("descriptors")
            .with_operation(operation)
            .with_suggestion("Check the input file path in the [input] config section"),
    })?;

    serde_json::from_str(&content).map_err(|e| DashgenError::Config {
        message: format!("Failed to parse {}: {}", path.display(), e),
        source: Some(Box::new(e)),
        context: ErrorContext::new("descriptors").with_operation(operation),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_source() {
        let mut descriptor = RepositoryDescriptor {
            url: "https://github.com/octo/sdk".to_string(),
            name: "SDK".to_string(),
            tech: "C".to_string(),
            examples_folder: NOT_CHECK.to_string(),
            extension: Some("c".to_string()),
        };
        assert!(!descriptor.follows_convention());
        assert_eq!(
            descriptor.example_source().unwrap(),
            ExampleSource::Extension("c")
        );

        descriptor.extension = None;
        assert!(matches!(
            descriptor.example_source(),
            Err(DashgenError::Validation { .. })
        ));

        descriptor.examples_folder = "examples".to_string();
        assert_eq!(
            descriptor.example_source().unwrap(),
            ExampleSource::Folder("examples")
        );
    }

    #[test]
    fn test_rank_accepts_numbers_and_text() {
        let categories: Vec<CategoryDescriptor> = serde_json::from_str(
            r#"[{"app_type": "Sensing", "mm_rank": 1}, {"app_type": "Other", "mm_rank": "n/a"}]"#,
        )
        .unwrap();

        assert_eq!(categories[0].mm_rank, Rank::Number(1));
        assert_eq!(categories[1].mm_rank, Rank::Text("n/a".to_string()));
        assert_eq!(
            categories[0].mm_rank.sort_cmp(&categories[1].mm_rank),
            Ordering::Less
        );
        assert_eq!(categories[1].mm_rank.to_string(), "n/a");
    }

    #[test]
    fn test_rank_accepts_floats_and_null() {
        let categories: Vec<CategoryDescriptor> = serde_json::from_str(
            r#"[
                {"app_type": "Sensing", "mm_rank": 1.5},
                {"app_type": "Metering", "mm_rank": null},
                {"app_type": "Lighting"},
                {"app_type": "Actuation", "mm_rank": 2}
            ]"#,
        )
        .unwrap();

        assert_eq!(categories[0].mm_rank, Rank::Float(1.5));
        assert_eq!(categories[1].mm_rank, Rank::Unranked);
        assert_eq!(categories[2].mm_rank, Rank::Unranked);
        assert_eq!(categories[0].mm_rank.to_string(), "1.5");
        assert_eq!(categories[1].mm_rank.to_string(), "");

        let mut ranks = vec![
            Rank::Unranked,
            Rank::Text("n/a".to_string()),
            Rank::Number(2),
            Rank::Float(1.5),
            Rank::Number(1),
        ];
        ranks.sort_by(|a, b| a.sort_cmp(b));
        assert_eq!(
            ranks,
            vec![
                Rank::Number(1),
                Rank::Float(1.5),
                Rank::Number(2),
                Rank::Text("n/a".to_string()),
                Rank::Unranked,
            ]
        );
    }
}
