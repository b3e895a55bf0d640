//! [`DynamicClient`] backed by a real API server

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use kube::{
    Client,
    api::{Api, DynamicObject, ListParams, WatchParams},
};
use tracing::debug;

use super::{DynamicClient, GroupVersionResource, WatchStream};
use crate::error::{DuckError, Result};
use crate::unstructured::UnstructuredList;

/// Dynamic client over `kube::Client`
#[derive(Clone)]
pub struct KubeDynamicClient {
    client: Client,
    /// Restrict list/watch to one namespace (None = all namespaces)
    namespace: Option<String>,
}

impl KubeDynamicClient {
    /// Client watching all namespaces
    pub fn new(client: Client) -> Self {
        Self {
            client,
            namespace: None,
        }
    }

    /// Client scoped to a single namespace
    pub fn namespaced(client: Client, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: Some(namespace.into()),
        }
    }

    fn api(&self, gvr: &GroupVersionResource) -> Api<DynamicObject> {
        let resource = gvr.api_resource();
        match &self.namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, &resource),
            None => Api::all_with(self.client.clone(), &resource),
        }
    }
}

#[async_trait]
impl DynamicClient for KubeDynamicClient {
    async fn list(
        &self,
        gvr: &GroupVersionResource,
        params: &ListParams,
    ) -> Result<UnstructuredList> {
        let list = self.api(gvr).list(params).await?;
        debug!(gvr = %gvr, items = list.items.len(), "listed resources");
        Ok(UnstructuredList::from(list))
    }

    async fn watch(
        &self,
        gvr: &GroupVersionResource,
        params: &WatchParams,
        resource_version: &str,
    ) -> Result<WatchStream<DynamicObject>> {
        let stream = self.api(gvr).watch(params, resource_version).await?;
        debug!(gvr = %gvr, resource_version, "watch started");
        Ok(stream.map_err(DuckError::Api).boxed())
    }
}
