//! Error types for kduck-apis

use thiserror::Error;

/// Result type for kduck-apis operations
pub type Result<T> = std::result::Result<T, DuckError>;

/// Errors that can occur while listing, watching or converting duck-typed resources
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DuckError {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    /// Error reported by a dynamic client that is not backed by the API server
    #[error("{0}")]
    Client(String),

    /// An unstructured object could not be decoded into the requested type
    #[error("failed to convert '{key}' into {type_name}: {message}")]
    Conversion {
        key: String,
        type_name: &'static str,
        message: String,
    },

    /// Object missing from a lister
    #[error("{resource} \"{name}\" not found")]
    NotFound { resource: String, name: String },

    /// The informer never reached a synced state
    #[error("failed starting shared informer for {gvr} with type {type_name}")]
    CacheSyncFailed { gvr: String, type_name: &'static str },

    /// The watch stream reported an error status
    #[error("watch failed ({code} {reason}): {message}")]
    Watch {
        code: u16,
        reason: String,
        message: String,
    },

    /// A concrete object does not carry the fields of a duck type
    #[error("{type_name} does not implement the duck type {duck}: {message}")]
    NotImplemented {
        type_name: String,
        duck: &'static str,
        message: String,
    },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for DuckError {
    fn from(e: serde_json::Error) -> Self {
        DuckError::Serialization(e.to_string())
    }
}

impl DuckError {
    /// Check if this is a Kubernetes or lister 404 Not Found error
    pub fn is_not_found(&self) -> bool {
        match self {
            DuckError::Api(kube::Error::Api(resp)) => resp.code == 404,
            DuckError::NotFound { .. } => true,
            _ => false,
        }
    }

    /// Check if the watch expired and a relist is needed (410 Gone)
    pub fn is_gone(&self) -> bool {
        match self {
            DuckError::Api(kube::Error::Api(resp)) => resp.code == 410,
            DuckError::Watch { code, .. } => *code == 410,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = DuckError::NotFound {
            resource: "resources.pkg.kduck.dev".to_string(),
            name: "bar".to_string(),
        };
        assert_eq!(err.to_string(), "resources.pkg.kduck.dev \"bar\" not found");
        assert!(err.is_not_found());
        assert!(!err.is_gone());
    }

    #[test]
    fn test_watch_gone() {
        let err = DuckError::Watch {
            code: 410,
            reason: "Expired".to_string(),
            message: "too old resource version".to_string(),
        };
        assert!(err.is_gone());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_cache_sync_failed_display() {
        let err = DuckError::CacheSyncFailed {
            gvr: "resources.v2.pkg.kduck.dev".to_string(),
            type_name: "AddressableType",
        };
        insta::assert_snapshot!(
            err.to_string(),
            @"failed starting shared informer for resources.v2.pkg.kduck.dev with type AddressableType"
        );
    }
}
