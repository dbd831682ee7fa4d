//! Text extraction from example description files
//!
//! Category labels come from shields.io badge images, titles from the first
//! level-one markdown heading. Both go through [`ExampleExtractor`] so the
//! matching strategy can change without touching the fetch logic.

use dashgen_core::{BadgeStyle, DashgenError, DashgenResult, ErrorContext, ScanConfig};
use regex::Regex;
use std::borrow::Cow;

/// Extracts example metadata from a description document
pub trait ExampleExtractor: Send + Sync {
    /// Category labels in document order, percent-decoded. Empty when the
    /// document carries no category badge.
    fn category_labels(&self, document: &str) -> Vec<String>;

    /// Text of the first level-one heading with `#` characters removed and
    /// surrounding whitespace trimmed. `None` when there is no such heading.
    fn title(&self, document: &str) -> Option<String>;
}

/// Regex-based extractor matching a badge pattern with one capture group
#[derive(Debug, Clone)]
pub struct BadgeExtractor {
    badge: Regex,
    heading: Regex,
}

impl BadgeExtractor {
    pub fn new(badge_pattern: &str) -> DashgenResult<Self> {
        let badge = Regex::new(badge_pattern).map_err(|e| DashgenError::Config {
            message: format!("Invalid badge pattern '{}': {}", badge_pattern, e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("badge_extractor").with_operation("new"),
        })?;

        if badge.captures_len() != 2 {
            return Err(DashgenError::Config {
                message: format!(
                    "Badge pattern must have exactly one capture group: '{}'",
                    badge_pattern
                ),
                source: None,
                context: ErrorContext::new("badge_extractor")
                    .with_operation("new")
                    .with_suggestion("Wrap the label in a single (...) group"),
            });
        }

        let heading = Regex::new(r"(?m)^# (.+)$").map_err(|e| DashgenError::Config {
            message: format!("Invalid heading pattern: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("badge_extractor").with_operation("new"),
        })?;

        Ok(Self { badge, heading })
    }

    pub fn from_style(style: BadgeStyle) -> DashgenResult<Self> {
        Self::new(style.pattern())
    }

    pub fn from_config(scan: &ScanConfig) -> DashgenResult<Self> {
        Self::new(scan.badge_regex())
    }
}

fn decode_label(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(Cow::Borrowed(label)) => label.to_string(),
        Ok(Cow::Owned(label)) => label,
        // Not valid UTF-8 once decoded: only undo the space escapes
        Err(_) => raw.replace("%20", " "),
    }
}

impl ExampleExtractor for BadgeExtractor {
    fn category_labels(&self, document: &str) -> Vec<String> {
        self.badge
            .captures_iter(document)
            .filter_map(|caps| caps.get(1))
            .map(|label| decode_label(label.as_str()))
            .collect()
    }

    fn title(&self, document: &str) -> Option<String> {
        self.heading
            .captures(document)
            .and_then(|caps| caps.get(1))
            .map(|heading| heading.as_str().replace('#', "").trim().to_string())
            .filter(|title| !title.is_empty())
    }
}
