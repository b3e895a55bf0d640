//! Webhook server options

use serde::{Deserialize, Serialize};

use crate::error::{Result, WebhookError};

/// Environment variable overriding the listen port
pub const PORT_ENV: &str = "WEBHOOK_PORT";

/// Port used when none is configured
pub const DEFAULT_PORT: u16 = 8443;

/// How the webhook is exposed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookOptions {
    /// Name of the Service fronting the webhook
    pub service_name: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Secret holding the serving certificate, managed elsewhere
    #[serde(default)]
    pub secret_name: String,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl WebhookOptions {
    pub fn new(service_name: impl Into<String>, secret_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            port: default_port(),
            secret_name: secret_name.into(),
        }
    }

    /// Options with the port taken from `WEBHOOK_PORT` when set
    pub fn from_env(
        service_name: impl Into<String>,
        secret_name: impl Into<String>,
    ) -> Result<Self> {
        Self::new(service_name, secret_name).with_port_override(std::env::var(PORT_ENV).ok())
    }

    /// Load options from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Apply a port given as a string. Empty or missing values keep the
    /// current port.
    pub fn with_port_override(mut self, port: Option<String>) -> Result<Self> {
        if let Some(port) = port.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            self.port = port.parse().map_err(|_| {
                WebhookError::InvalidOptions(format!("{} {:?} is not a valid port", PORT_ENV, port))
            })?;
        }
        Ok(self)
    }
}
