//! Minimum Kubernetes version gate
//!
//! Controllers call [`check_minimum_version`] at startup to refuse running
//! against an API server older than they support. The minimum can be
//! lowered or raised through the `KUBERNETES_MIN_VERSION` environment
//! variable.

pub mod error;

use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::version::Info;
use semver::{BuildMetadata, Prerelease, Version};
use tracing::debug;

pub use error::{Result, VersionError};

/// Environment variable overriding the minimum version
pub const KUBERNETES_MIN_VERSION_KEY: &str = "KUBERNETES_MIN_VERSION";

/// Minimum version used when no override is set
pub const DEFAULT_MINIMUM_VERSION: &str = "v1.32.0";

/// Anything that can report the API server version
#[async_trait]
pub trait ServerVersioner: Send + Sync {
    async fn server_version(&self) -> Result<Info>;
}

#[async_trait]
impl ServerVersioner for kube::Client {
    async fn server_version(&self) -> Result<Info> {
        Ok(self.apiserver_version().await?)
    }
}

/// The minimum version in effect: the env override when non-empty, the
/// default otherwise
pub fn minimum_version() -> String {
    minimum_version_from(std::env::var(KUBERNETES_MIN_VERSION_KEY).ok().as_deref())
}

fn minimum_version_from(override_version: Option<&str>) -> String {
    match override_version.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => DEFAULT_MINIMUM_VERSION.to_string(),
    }
}

/// Fail if the server reports a version older than [`minimum_version`]
pub async fn check_minimum_version(versioner: &dyn ServerVersioner) -> Result<()> {
    check_against(versioner, &minimum_version()).await
}

async fn check_against(versioner: &dyn ServerVersioner, minimum: &str) -> Result<()> {
    let info = versioner.server_version().await?;
    let current = parse(&info.git_version)?;

    let mut required = parse(minimum)?;
    // Accept pre-releases of the minimum itself, e.g. 1.32.0-k3s.1.
    if required.pre.is_empty() {
        required.pre = Prerelease::new("0").map_err(|source| VersionError::Parse {
            version: minimum.to_string(),
            source,
        })?;
    }

    debug!(current = %current, minimum = %required, "checking server version");
    if current < required {
        return Err(VersionError::TooOld {
            current: info.git_version,
            minimum: minimum.to_string(),
            key: KUBERNETES_MIN_VERSION_KEY,
        });
    }
    Ok(())
}

/// Parse a version with an optional leading `v`, dropping build metadata
fn parse(version: &str) -> Result<Version> {
    let trimmed = version.trim();
    let mut parsed = Version::parse(trimmed.strip_prefix('v').unwrap_or(trimmed)).map_err(
        |source| VersionError::Parse {
            version: version.to_string(),
            source,
        },
    )?;
    parsed.build = BuildMetadata::EMPTY;
    Ok(parsed)
}
