//! Unified error handling system
//!
//! Every layer of the gateway reports failures through [`GrnwoodError`]. Each
//! variant carries an [`ErrorContext`] so a failure seen by a client can be
//! matched to the log line that recorded it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

pub type GrnwoodResult<T> = Result<T, GrnwoodError>;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

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
    /// Additional metadata
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

/// Main error type for the gateway
#[derive(Error, Debug)]
pub enum GrnwoodError {
    /// No record matched the query
    #[error("Resource not found: {resource}")]
    NotFound {
        resource: String,
        context: ErrorContext,
    },

    /// A unique property already holds the value being written
    #[error("Constraint violation: {message}")]
    ConstraintViolation {
        message: String,
        constraint: Option<String>,
        context: ErrorContext,
    },

    /// The datastore could not be reached
    #[error("Connectivity error: {message}")]
    Connectivity {
        message: String,
        #[source]
        source: Option<BoxedSource>,
        context: ErrorContext,
    },

    #[error("Authentication error: {message}")]
    Authentication {
        message: String,
        context: ErrorContext,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
        context: ErrorContext,
    },

    /// Requested bookmarks cannot be honoured by the session
    #[error("Consistency error: {message}")]
    Consistency {
        message: String,
        context: ErrorContext,
    },

    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<BoxedSource>,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<BoxedSource>,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<BoxedSource>,
        context: ErrorContext,
    },
}

impl GrnwoodError {
    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            GrnwoodError::NotFound { context, .. } => Some(context),
            GrnwoodError::ConstraintViolation { context, .. } => Some(context),
            GrnwoodError::Connectivity { context, .. } => Some(context),
            GrnwoodError::Authentication { context, .. } => Some(context),
            GrnwoodError::Validation { context, .. } => Some(context),
            GrnwoodError::Consistency { context, .. } => Some(context),
            GrnwoodError::Storage { context, .. } => Some(context),
            GrnwoodError::Config { context, .. } => Some(context),
            GrnwoodError::Internal { context, .. } => Some(context),
            GrnwoodError::Io(_) | GrnwoodError::Serialization(_) => None,
        }
    }

    /// Stable machine-readable code, used in API error bodies
    pub fn code(&self) -> &'static str {
        match self {
            GrnwoodError::NotFound { .. } => "not_found",
            GrnwoodError::ConstraintViolation { .. } => "constraint_violation",
            GrnwoodError::Connectivity { .. } => "connectivity_error",
            GrnwoodError::Authentication { .. } => "auth_error",
            GrnwoodError::Validation { .. } => "validation_error",
            GrnwoodError::Consistency { .. } => "consistency_error",
            GrnwoodError::Storage { .. } => "storage_error",
            GrnwoodError::Config { .. } => "config_error",
            GrnwoodError::Io(_) | GrnwoodError::Serialization(_) => "internal_error",
            GrnwoodError::Internal { .. } => "internal_error",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, GrnwoodError::NotFound { .. })
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, GrnwoodError::ConstraintViolation { .. })
    }

    /// Check if error is recoverable by the caller retrying later.
    ///
    /// Nothing in the gateway retries on its own; this only informs clients.
    pub fn is_recoverable(&self) -> bool {
        match self {
            GrnwoodError::Connectivity { .. } => true,
            GrnwoodError::Consistency { .. } => true,
            _ => false,
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        let error_id = self.context().map(|c| c.error_id.as_str());
        match self {
            GrnwoodError::Internal { .. } | GrnwoodError::Storage { .. } => {
                error!(error_id = ?error_id, error = %self, "Internal error occurred");
            }
            GrnwoodError::Config { .. } => {
                error!(error_id = ?error_id, error = %self, "Configuration error");
            }
            GrnwoodError::Connectivity { .. } | GrnwoodError::Consistency { .. } => {
                warn!(
                    error_id = ?error_id,
                    error = %self,
                    "Datastore error (may be recoverable)"
                );
            }
            GrnwoodError::NotFound { .. }
            | GrnwoodError::Validation { .. }
            | GrnwoodError::Authentication { .. }
            | GrnwoodError::ConstraintViolation { .. } => {
                warn!(error_id = ?error_id, error = %self, "Request rejected");
            }
            _ => {
                error!(error_id = ?error_id, error = %self, "Error occurred");
            }
        }
    }
}

/// Convenience macros for creating errors with context
#[macro_export]
macro_rules! not_found_error {
    ($resource:expr, $component:expr) => {
        $crate::GrnwoodError::NotFound {
            resource: $resource.to_string(),
            context: $crate::ErrorContext::new($component),
        }
    };
}

#[macro_export]
macro_rules! validation_error {
    ($msg:expr, $field:expr, $component:expr) => {
        $crate::GrnwoodError::Validation {
            message: $msg.to_string(),
            field: Some($field.to_string()),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check the field value and format"),
        }
    };
}

#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::GrnwoodError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check your configuration file and environment"),
        }
    };
}

#[macro_export]
macro_rules! auth_error {
    ($msg:expr, $component:expr) => {
        $crate::GrnwoodError::Authentication {
            message: $msg.to_string(),
            context: $crate::ErrorContext::new($component),
        }
    };
}
