//! Unified error handling system
//!
//! Structured error types with context, recovery suggestions, and error chaining.
//! Every failure that ends a dashboard run surfaces as a [`DashgenError`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

pub type DashgenResult<T> = Result<T, DashgenError>;

/// Error context providing additional information for debugging and recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
    pub operation: Option<String>,
    /// Additional metadata (urls, repository names, status codes)
    pub metadata: std::collections::HashMap<String, String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            metadata: std::collections::HashMap::new(),
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Main error type for dashgen
#[derive(Error, Debug)]
pub enum DashgenError {
    /// The hosting API answered with an unexpected status or body
    #[error("Repository error: {message}")]
    Repository {
        message: String,
        /// HTTP status returned by the API, when there was a response at all
        status: Option<u16>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    /// No response was received from the remote end
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
        context: ErrorContext,
    },

    #[error("Resource not found: {resource}")]
    NotFound {
        resource: String,
        context: ErrorContext,
    },

    #[error("Render error: {message}")]
    Render {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

}

impl DashgenError {
    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            DashgenError::Repository { context, .. } => Some(context),
            DashgenError::Config { context, .. } => Some(context),
            DashgenError::Network { context, .. } => Some(context),
            DashgenError::Validation { context, .. } => Some(context),
            DashgenError::NotFound { context, .. } => Some(context),
            DashgenError::Render { context, .. } => Some(context),
            DashgenError::Io(_) => None,
        }
    }

    /// HTTP status attached to the error, if the remote end answered
    pub fn status(&self) -> Option<u16> {
        match self {
            DashgenError::Repository { status, .. } => *status,
            DashgenError::NotFound { .. } => Some(404),
            _ => None,
        }
    }

    /// True when the remote resource does not exist (HTTP 404)
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        let error_id = self.context().map(|c| c.error_id.as_str());
        match self {
            DashgenError::Config { .. } | DashgenError::Validation { .. } => {
                error!(
                    error_id = ?error_id,
                    error = %self,
                    "Configuration or validation error"
                );
            }
            DashgenError::Network { .. } => {
                warn!(
                    error_id = ?error_id,
                    error = %self,
                    "Network error"
                );
            }
            _ => {
                let url = self
                    .context()
                    .and_then(|c| c.metadata.get("url"))
                    .map(String::as_str);
                error!(
                    error_id = ?error_id,
                    url = ?url,
                    error = %self,
                    "Error occurred"
                );
            }
        }
    }
}

/// Convenience macros for creating errors with context
#[macro_export]
macro_rules! repository_error {
    ($msg:expr, $component:expr) => {
        $crate::DashgenError::Repository {
            message: $msg.to_string(),
            status: None,
            source: None,
            context: $crate::ErrorContext::new($component),
        }
    };
    ($msg:expr, $component:expr, $source:expr) => {
        $crate::DashgenError::Repository {
            message: $msg.to_string(),
            status: None,
            source: Some(Box::new($source)),
            context: $crate::ErrorContext::new($component),
        }
    };
}

#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::DashgenError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check your configuration file")
                .with_suggestion("Run 'dashgen config --init' to create a default config"),
        }
    };
    ($msg:expr, $component:expr, suggestion = $suggestion:expr) => {
        $crate::DashgenError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component).with_suggestion($suggestion),
        }
    };
}

#[macro_export]
macro_rules! validation_error {
    ($msg:expr, $field:expr, $component:expr) => {
        $crate::DashgenError::Validation {
            message: $msg.to_string(),
            field: Some($field.to_string()),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check the field value and format"),
        }
    };
    ($msg:expr, $field:expr, $component:expr, suggestion = $suggestion:expr) => {
        $crate::DashgenError::Validation {
            message: $msg.to_string(),
            field: Some($field.to_string()),
            context: $crate::ErrorContext::new($component).with_suggestion($suggestion),
        }
    };
}

#[macro_export]
macro_rules! not_found_error {
    ($resource:expr, $component:expr) => {
        $crate::DashgenError::NotFound {
            resource: $resource.to_string(),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Verify the resource path or URL")
                .with_suggestion("Check if the resource exists and is accessible"),
        }
    };
}
