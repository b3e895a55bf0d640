//! Observability configuration
//!
//! Read from the data of the observability ConfigMap, where every value is a
//! string:
//!
//! ```yaml
//! metrics.backend-destination: prometheus
//! metrics.reporting-period-seconds: "10"
//! metrics.request-metrics-backend-destination: opencensus
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{MetricsError, Result};

pub const BACKEND_DESTINATION_KEY: &str = "metrics.backend-destination";
pub const REPORTING_PERIOD_KEY: &str = "metrics.reporting-period-seconds";
pub const REQUEST_METRICS_BACKEND_KEY: &str = "metrics.request-metrics-backend-destination";
pub const OPENCENSUS_ADDRESS_KEY: &str = "metrics.opencensus-address";
pub const PROMETHEUS_PORT_KEY: &str = "metrics.prometheus-port";
pub const PROMETHEUS_HOST_KEY: &str = "metrics.prometheus-host";

/// Environment variable overriding the metrics domain
pub const METRICS_DOMAIN_ENV: &str = "METRICS_DOMAIN";

const DEFAULT_PROMETHEUS_PORT: u16 = 9090;
const DEFAULT_PROMETHEUS_HOST: &str = "0.0.0.0";

/// Where metrics are exported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricsBackend {
    #[default]
    Prometheus,
    OpenCensus,
    None,
}

impl MetricsBackend {
    /// Reporting period used when none is configured
    pub fn default_reporting_period(&self) -> Duration {
        match self {
            MetricsBackend::Prometheus => Duration::from_secs(5),
            MetricsBackend::OpenCensus => Duration::from_secs(60),
            MetricsBackend::None => Duration::ZERO,
        }
    }
}

impl FromStr for MetricsBackend {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prometheus" => Ok(MetricsBackend::Prometheus),
            "opencensus" => Ok(MetricsBackend::OpenCensus),
            "none" => Ok(MetricsBackend::None),
            other => Err(MetricsError::invalid_config(
                BACKEND_DESTINATION_KEY,
                format!("unsupported metrics backend {:?}", other),
            )),
        }
    }
}

impl fmt::Display for MetricsBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MetricsBackend::Prometheus => "prometheus",
            MetricsBackend::OpenCensus => "opencensus",
            MetricsBackend::None => "none",
        })
    }
}

/// Parsed observability settings for one component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservabilityConfig {
    /// Metrics domain, e.g. `kduck.dev/serving`
    pub domain: String,

    #[serde(default)]
    pub backend_destination: MetricsBackend,

    /// How often metrics are pushed or scraped
    #[serde(with = "duration_secs")]
    pub reporting_period: Duration,

    /// Backend for request metrics, when different from the main one
    #[serde(default)]
    pub request_metrics_backend: Option<MetricsBackend>,

    #[serde(default)]
    pub opencensus_address: Option<String>,

    #[serde(default = "default_prometheus_port")]
    pub prometheus_port: u16,

    #[serde(default = "default_prometheus_host")]
    pub prometheus_host: String,
}

fn default_prometheus_port() -> u16 {
    DEFAULT_PROMETHEUS_PORT
}

fn default_prometheus_host() -> String {
    DEFAULT_PROMETHEUS_HOST.to_string()
}

impl ObservabilityConfig {
    /// Defaults for `domain`: Prometheus, reported every 5 seconds
    pub fn new(domain: impl Into<String>) -> Self {
        let backend = MetricsBackend::default();
        Self {
            domain: domain.into(),
            backend_destination: backend,
            reporting_period: backend.default_reporting_period(),
            request_metrics_backend: None,
            opencensus_address: None,
            prometheus_port: default_prometheus_port(),
            prometheus_host: default_prometheus_host(),
        }
    }

    /// Parse ConfigMap data. Missing keys take their defaults.
    pub fn from_map(domain: impl Into<String>, data: &BTreeMap<String, String>) -> Result<Self> {
        let mut config = Self::new(domain);
        let value = |key: &str| data.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        if let Some(backend) = value(BACKEND_DESTINATION_KEY) {
            config.backend_destination = backend.parse()?;
        }
        config.reporting_period = match value(REPORTING_PERIOD_KEY) {
            Some(seconds) => {
                let seconds: u64 = seconds.parse().map_err(|_| {
                    MetricsError::invalid_config(
                        REPORTING_PERIOD_KEY,
                        format!("{:?} is not a whole number of seconds", seconds),
                    )
                })?;
                Duration::from_secs(seconds)
            }
            None => config.backend_destination.default_reporting_period(),
        };
        if let Some(backend) = value(REQUEST_METRICS_BACKEND_KEY) {
            let backend: MetricsBackend = backend.parse().map_err(|_| {
                MetricsError::invalid_config(
                    REQUEST_METRICS_BACKEND_KEY,
                    format!("unsupported metrics backend {:?}", backend),
                )
            })?;
            config.request_metrics_backend = Some(backend);
        }
        config.opencensus_address = value(OPENCENSUS_ADDRESS_KEY).map(str::to_string);
        if let Some(port) = value(PROMETHEUS_PORT_KEY) {
            config.prometheus_port = port.parse().map_err(|_| {
                MetricsError::invalid_config(PROMETHEUS_PORT_KEY, format!("invalid port {:?}", port))
            })?;
        }
        if let Some(host) = value(PROMETHEUS_HOST_KEY) {
            config.prometheus_host = host.to_string();
        }

        Ok(config)
    }

    /// Parse ConfigMap data written as YAML. Scalar values may be unquoted.
    pub fn from_yaml(domain: impl Into<String>, yaml: &str) -> Result<Self> {
        let raw: BTreeMap<String, serde_yaml::Value> = serde_yaml::from_str(yaml)?;
        let data = raw
            .into_iter()
            .map(|(key, value)| -> Result<(String, String)> {
                let value = match value {
                    serde_yaml::Value::String(s) => s,
                    serde_yaml::Value::Null => String::new(),
                    other => serde_yaml::to_string(&other)?.trim().to_string(),
                };
                Ok((key, value))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;
        Self::from_map(domain, &data)
    }

    /// Metrics domain from `METRICS_DOMAIN`, if set
    pub fn domain_from_env() -> Option<String> {
        std::env::var(METRICS_DOMAIN_ENV)
            .ok()
            .filter(|d| !d.is_empty())
    }

    /// Backend used for request metrics
    pub fn request_backend(&self) -> MetricsBackend {
        self.request_metrics_backend
            .unwrap_or(self.backend_destination)
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = ObservabilityConfig::from_map("kduck.dev/testing", &BTreeMap::new()).unwrap();
        assert_eq!(config, ObservabilityConfig::new("kduck.dev/testing"));
        assert_eq!(config.backend_destination, MetricsBackend::Prometheus);
        assert_eq!(config.reporting_period, Duration::from_secs(5));
        assert_eq!(config.prometheus_port, 9090);
        assert_eq!(config.request_backend(), MetricsBackend::Prometheus);
    }

    #[test]
    fn test_opencensus_default_period() {
        let config = ObservabilityConfig::from_map(
            "kduck.dev/testing",
            &data(&[(BACKEND_DESTINATION_KEY, "OpenCensus")]),
        )
        .unwrap();
        assert_eq!(config.backend_destination, MetricsBackend::OpenCensus);
        assert_eq!(config.reporting_period, Duration::from_secs(60));
    }

    #[test]
    fn test_explicit_values() {
        let config = ObservabilityConfig::from_map(
            "kduck.dev/testing",
            &data(&[
                (BACKEND_DESTINATION_KEY, "prometheus"),
                (REPORTING_PERIOD_KEY, "10"),
                (REQUEST_METRICS_BACKEND_KEY, "opencensus"),
                (PROMETHEUS_PORT_KEY, "9091"),
            ]),
        )
        .unwrap();
        assert_eq!(config.reporting_period, Duration::from_secs(10));
        assert_eq!(config.request_backend(), MetricsBackend::OpenCensus);
        assert_eq!(config.prometheus_port, 9091);
    }

    #[test]
    fn test_invalid_values() {
        let err = ObservabilityConfig::from_map(
            "kduck.dev/testing",
            &data(&[(BACKEND_DESTINATION_KEY, "stackdriver")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("stackdriver"));

        let err = ObservabilityConfig::from_map(
            "kduck.dev/testing",
            &data(&[(REPORTING_PERIOD_KEY, "soon")]),
        )
        .unwrap_err();
        assert!(matches!(err, MetricsError::InvalidConfig { key, .. } if key == REPORTING_PERIOD_KEY));
    }

    #[test]
    fn test_from_yaml() {
        let config = ObservabilityConfig::from_yaml(
            "kduck.dev/testing",
            r#"
metrics.backend-destination: opencensus
metrics.reporting-period-seconds: 30
metrics.opencensus-address: collector.observability:55678
"#,
        )
        .unwrap();
        assert_eq!(config.backend_destination, MetricsBackend::OpenCensus);
        assert_eq!(config.reporting_period, Duration::from_secs(30));
        assert_eq!(
            config.opencensus_address.as_deref(),
            Some("collector.observability:55678")
        );
    }
}
