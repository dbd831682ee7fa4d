//! Configuration management

use crate::error::{DashgenError, DashgenResult};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};

use std::path::{Path, PathBuf};

/// Top-level configuration, stored as TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashgenConfig {
    pub api: ApiConfig,
    pub scan: ScanConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// REST API root
    pub base_url: String,
    /// Host serving raw file contents
    pub raw_base_url: String,
    /// Web host used to build links to examples
    pub web_base_url: String,
    pub user_agent: String,
    /// Request timeout; unset means the HTTP client default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Folder names never counted or scanned as examples
    pub excluded_folders: Vec<String>,
    /// Description file fetched from every example folder
    pub readme_file: String,
    pub badge_style: BadgeStyle,
    /// Custom badge regex with exactly one capture group; overrides `badge_style`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge_pattern: Option<String>,
    pub manifest: ManifestConfig,
}

/// Built-in badge conventions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeStyle {
    /// `![Type badge](https://img.shields.io/badge/<label>-salmon...)`, one or more per README
    Typed,
    /// `shields.io/badge/Type-<label>-green`
    Legacy,
}

impl BadgeStyle {
    pub fn pattern(self) -> &'static str {
        match self {
            BadgeStyle::Typed => r"!\[Type badge\]\(https://img\.shields\.io/badge/(.+?)-salmon",
            BadgeStyle::Legacy => r"shields\.io/badge/Type-(.+?)-green",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestConfig {
    /// Manifest file looked up at the repository root
    pub default_file: String,
    /// Substring counted once per example in the manifest
    pub marker: String,
    #[serde(default)]
    pub overrides: Vec<ManifestOverride>,
}

/// Use `file` instead of the default manifest for repositories whose name contains `repo_contains`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestOverride {
    pub repo_contains: String,
    pub file: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    pub repositories: PathBuf,
    pub categories: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: PathBuf,
    pub title: String,
}

impl Default for DashgenConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "https://api.github.com".to_string(),
                raw_base_url: "https://raw.githubusercontent.com".to_string(),
                web_base_url: "https://github.com".to_string(),
                user_agent: format!("dashgen/{}", env!("CARGO_PKG_VERSION")),
                timeout_seconds: None,
            },
            scan: ScanConfig {
                excluded_folders: vec![
                    ".github".to_string(),
                    "deprecated".to_string(),
                    "doc".to_string(),
                ],
                readme_file: "README.md".to_string(),
                badge_style: BadgeStyle::Typed,
                badge_pattern: None,
                manifest: ManifestConfig {
                    default_file: "templates.xml".to_string(),
                    marker: ".slcp".to_string(),
                    overrides: vec![ManifestOverride {
                        repo_contains: "energy_harvesting_applications".to_string(),
                        file: "energy_harvesting_templates.xml".to_string(),
                    }],
                },
            },
            input: InputConfig {
                repositories: PathBuf::from("data/repository_info.json"),
                categories: PathBuf::from("data/application_info.json"),
            },
            output: OutputConfig {
                path: PathBuf::from("index.html"),
                title: "Example Repositories Dashboard".to_string(),
            },
            logging: LoggingConfig::default(),
        }
    }
}

impl ScanConfig {
    /// Effective badge regex
    pub fn badge_regex(&self) -> &str {
        self.badge_pattern
            .as_deref()
            .unwrap_or_else(|| self.badge_style.pattern())
    }

    pub fn is_excluded(&self, folder: &str) -> bool {
        self.excluded_folders.iter().any(|f| f == folder)
    }
}

impl ManifestConfig {
    /// Manifest file name for a repository
    pub fn file_for(&self, repo_name: &str) -> &str {
        self.overrides
            .iter()
            .find(|o| repo_name.contains(&o.repo_contains))
            .map(|o| o.file.as_str())
            .unwrap_or(self.default_file.as_str())
    }
}

impl DashgenConfig {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> DashgenResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DashgenError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: crate::ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: DashgenConfig = toml::from_str(&content).map_err(|e| DashgenError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: crate::ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> DashgenResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| DashgenError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: crate::ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| DashgenError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: crate::ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> DashgenResult<()> {
        for (field, value) in [
            ("api.base_url", &self.api.base_url),
            ("api.raw_base_url", &self.api.raw_base_url),
            ("api.web_base_url", &self.api.web_base_url),
        ] {
            if url::Url::parse(value).is_err() {
                return Err(invalid(
                    format!("{} is not a valid URL: '{}'", field, value),
                    &format!("Set {} to an absolute http(s) URL", field),
                ));
            }
        }

        if self.api.timeout_seconds == Some(0) {
            return Err(invalid(
                "api.timeout_seconds must be greater than 0".to_string(),
                "Remove api.timeout_seconds to use the client default",
            ));
        }

        if self.scan.readme_file.is_empty() {
            return Err(invalid(
                "scan.readme_file must not be empty".to_string(),
                "Set scan.readme_file, usually README.md",
            ));
        }

        if self.scan.manifest.marker.is_empty() {
            return Err(invalid(
                "scan.manifest.marker must not be empty".to_string(),
                "Set scan.manifest.marker to the substring counted per example",
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(invalid(
                format!("Unknown logging.level '{}'", self.logging.level),
                "Use one of trace, debug, info, warn, error",
            ));
        }

        for directive in &self.logging.filter_directives {
            if directive.parse::<tracing_subscriber::filter::Directive>().is_err() {
                return Err(invalid(
                    format!("Invalid logging filter directive '{}'", directive),
                    "Directives look like target=level, e.g. reqwest=warn",
                ));
            }
        }

        let pattern = self.scan.badge_regex();
        match regex::Regex::new(pattern) {
            Ok(re) if re.captures_len() == 2 => {}
            Ok(_) => {
                return Err(invalid(
                    format!("Badge pattern must have exactly one capture group: {}", pattern),
                    "Wrap the label part of scan.badge_pattern in a single (...) group",
                ))
            }
            Err(e) => {
                return Err(DashgenError::Config {
                    message: format!("Invalid badge pattern: {}", e),
                    source: Some(Box::new(e)),
                    context: crate::ErrorContext::new("config").with_operation("validate"),
                })
            }
        }

        Ok(())
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

fn invalid(message: String, suggestion: &str) -> DashgenError {
    crate::config_error!(message, "config", suggestion = suggestion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogFormat;

    #[test]
    fn test_manifest_file_override() {
        let config = DashgenConfig::default();
        let manifest = &config.scan.manifest;

        assert_eq!(manifest.file_for("peripheral_examples"), "templates.xml");
        assert_eq!(
            manifest.file_for("energy_harvesting_applications"),
            "energy_harvesting_templates.xml"
        );
    }

    #[test]
    fn test_badge_pattern_selection() {
        let mut scan = DashgenConfig::default().scan;
        assert_eq!(scan.badge_regex(), BadgeStyle::Typed.pattern());

        scan.badge_style = BadgeStyle::Legacy;
        assert_eq!(scan.badge_regex(), BadgeStyle::Legacy.pattern());

        scan.badge_pattern = Some(r"badge/(\w+)".to_string());
        assert_eq!(scan.badge_regex(), r"badge/(\w+)");
    }

    #[test]
    fn test_logging_section() {
        let mut config = DashgenConfig::default();
        config.logging.format = LogFormat::Json;
        let content = toml::to_string_pretty(&config).unwrap();
        assert!(content.contains("[logging]"));

        let parsed: DashgenConfig = toml::from_str(&content).unwrap();
        assert_eq!(parsed.logging.format, LogFormat::Json);

        // Older files without the section still load
        let trimmed = content.split("[logging]").next().unwrap();
        let parsed: DashgenConfig = toml::from_str(trimmed).unwrap();
        assert_eq!(parsed.logging, LoggingConfig::default());

        let parsed: DashgenConfig =
            toml::from_str(&format!("{}[logging]\nformat = \"pretty\"\n", trimmed)).unwrap();
        assert_eq!(parsed.logging.format, LogFormat::Pretty);
        assert_eq!(parsed.logging.level, "info");
    }

    #[test]
    fn test_logging_validation() {
        let mut config = DashgenConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = DashgenConfig::default();
        config.logging.filter_directives.push("reqwest=shouting".to_string());
        assert!(config.validate().is_err());

        let mut config = DashgenConfig::default();
        config.logging.level = "DEBUG".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_verbose_keeps_format() {
        let logging = LoggingConfig {
            format: LogFormat::Json,
            ..LoggingConfig::default()
        }
        .with_verbose();

        assert_eq!(logging.format, LogFormat::Json);
        assert_eq!(logging.level, "debug");
        assert!(logging.filter_directives.contains(&"dashgen_repo=debug".to_string()));
        assert!(logging.filter_directives.contains(&"reqwest=warn".to_string()));
    }

    #[test]
    fn test_excluded_folders() {
        let scan = DashgenConfig::default().scan;
        assert!(scan.is_excluded(".github"));
        assert!(scan.is_excluded("deprecated"));
        assert!(scan.is_excluded("doc"));
        assert!(!scan.is_excluded("docs"));
    }
}
