//! Dynamic client seam
//!
//! The duck layer only needs two verbs from the API server: list and watch,
//! on unstructured objects, addressed by group/version/resource. Keeping that
//! behind [`DynamicClient`] lets the informer machinery run against a real
//! cluster ([`KubeDynamicClient`]) or an in-memory fake ([`FakeDynamicClient`]).

mod fake;
mod kube_client;

pub use fake::{FakeDynamicClient, OperationCounts};
pub use kube_client::KubeDynamicClient;

use std::fmt;

use async_trait::async_trait;
use futures::stream::BoxStream;
use kube::api::{DynamicObject, ListParams, WatchEvent, WatchParams};
use kube::discovery::ApiResource;

use crate::error::Result;
use crate::unstructured::UnstructuredList;

/// A stream of watch events. Transport errors surface as `Err` items,
/// API-reported errors as [`WatchEvent::Error`].
pub type WatchStream<K> = BoxStream<'static, Result<WatchEvent<K>>>;

/// Identifies a resource collection on the API server
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct GroupVersionResource {
    /// API group, empty for the core group
    pub group: String,
    pub version: String,
    /// Plural resource name (e.g. `deployments`)
    pub resource: String,
}

impl GroupVersionResource {
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            resource: resource.into(),
        }
    }

    /// `group/version`, or just `version` for the core group
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    pub fn group_resource(&self) -> GroupResource {
        GroupResource {
            group: self.group.clone(),
            resource: self.resource.clone(),
        }
    }

    /// API resource used to address this collection with `kube::Api`.
    ///
    /// Only the plural is known from a GVR, so `kind` is left empty; list
    /// and watch URLs do not depend on it.
    pub fn api_resource(&self) -> ApiResource {
        ApiResource {
            group: self.group.clone(),
            version: self.version.clone(),
            api_version: self.api_version(),
            kind: String::new(),
            plural: self.resource.clone(),
        }
    }
}

impl fmt::Display for GroupVersionResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}.{}", self.resource, self.version)
        } else {
            write!(f, "{}.{}.{}", self.resource, self.version, self.group)
        }
    }
}

/// A resource collection independent of version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct GroupResource {
    pub group: String,
    pub resource: String,
}

impl fmt::Display for GroupResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            f.write_str(&self.resource)
        } else {
            write!(f, "{}.{}", self.resource, self.group)
        }
    }
}

/// List and watch unstructured objects
///
/// Implementations must be Send + Sync for use across async tasks.
#[async_trait]
pub trait DynamicClient: Send + Sync {
    /// List all objects of a resource collection
    async fn list(&self, gvr: &GroupVersionResource, params: &ListParams)
    -> Result<UnstructuredList>;

    /// Watch a resource collection starting after `resource_version`
    async fn watch(
        &self,
        gvr: &GroupVersionResource,
        params: &WatchParams,
        resource_version: &str,
    ) -> Result<WatchStream<DynamicObject>>;
}
