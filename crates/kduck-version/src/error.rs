//! Error types for kduck-version

use thiserror::Error;

/// Result type for version checks
pub type Result<T> = std::result::Result<T, VersionError>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VersionError {
    /// The server version could not be fetched
    #[error("failed to fetch server version: {0}")]
    Fetch(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A version string is not valid semver
    #[error("could not parse version {version:?}: {source}")]
    Parse {
        version: String,
        source: semver::Error,
    },

    /// The server is older than the required minimum
    #[error(
        "kubernetes version {current:?} is not compatible, need at least {minimum:?} \
         (this can be overridden with the env var {key:?})"
    )]
    TooOld {
        current: String,
        minimum: String,
        key: &'static str,
    },
}

impl From<kube::Error> for VersionError {
    fn from(e: kube::Error) -> Self {
        VersionError::Fetch(Box::new(e))
    }
}
