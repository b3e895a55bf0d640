//! Error types for kduck-metrics

use thiserror::Error;

/// Result type for metrics operations
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Errors from view registration, data retrieval and configuration
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MetricsError {
    // ============ View Errors ============
    #[error("cannot register view {name:?}: a different view with the same name is already registered")]
    ViewConflict { name: String },

    #[error("cannot retrieve data; view {name:?} is not registered")]
    ViewNotRegistered { name: String },

    // ============ Configuration Errors ============
    #[error("invalid observability config {key:?}: {message}")]
    InvalidConfig { key: String, message: String },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl MetricsError {
    pub(crate) fn invalid_config(key: &str, message: impl Into<String>) -> Self {
        MetricsError::InvalidConfig {
            key: key.to_string(),
            message: message.into(),
        }
    }
}
