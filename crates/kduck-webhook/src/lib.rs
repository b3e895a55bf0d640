//! CRD conversion webhook
//!
//! Serves `ConversionReview` requests from the Kubernetes API server and
//! dispatches them to [`ConversionController`]s mounted at their own paths.
//!
//! - **Review types**: the `apiextensions.k8s.io/v1` wire format
//! - **Controllers**: implement [`ConversionController`], or use
//!   [`HubConversion`] to convert through a hub version
//! - **Server**: [`Webhook`] on axum with graceful shutdown
//! - **Metrics**: handler latency per desired group, version and outcome

pub mod conversion;
pub mod error;
pub mod hub;
pub mod options;
pub mod review;
pub mod server;
pub mod stats;

pub use conversion::ConversionController;
pub use error::{Result, WebhookError};
pub use hub::{GroupKind, HubConversion, KindConversion, VersionConverter};
pub use options::{DEFAULT_PORT, PORT_ENV, WebhookOptions};
pub use review::{
    ConversionRequest, ConversionResponse, ConversionReview, REVIEW_API_VERSION, REVIEW_KIND,
    Status, StatusSummary, split_api_version,
};
pub use server::Webhook;
