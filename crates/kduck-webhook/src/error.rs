//! Error types for kduck-webhook

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Result type for webhook operations
pub type Result<T> = std::result::Result<T, WebhookError>;

/// Errors from serving and configuring the webhook
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WebhookError {
    /// The request body is not a usable conversion review
    #[error("{0}")]
    InvalidReview(String),

    #[error("invalid webhook options: {0}")]
    InvalidOptions(String),

    #[error("metrics error: {0}")]
    Metrics(#[from] kduck_metrics::MetricsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebhookError::InvalidReview(_) | WebhookError::InvalidOptions(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
