use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use kube::api::{ListParams, WatchParams};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{InformerFactory, InformerPair};
use crate::client::{DynamicClient, GroupVersionResource};
use crate::duck::Duck;
use crate::error::{DuckError, Result};
use crate::informer::{GenericLister, ListWatch, SharedInformer};
use crate::unstructured::from_unstructured_list;
use crate::watch::as_structured_watcher;

/// Builds informers whose unstructured objects are converted into `T`.
///
/// Informers run until `cancellation` fires.
pub struct TypedInformerFactory<T> {
    client: Arc<dyn DynamicClient>,
    resync_period: Duration,
    cancellation: CancellationToken,
    _type: PhantomData<fn() -> T>,
}

impl<T: Duck> TypedInformerFactory<T> {
    pub fn new(
        client: Arc<dyn DynamicClient>,
        resync_period: Duration,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            client,
            resync_period,
            cancellation,
            _type: PhantomData,
        }
    }

    fn list_watch(&self, gvr: &GroupVersionResource) -> ListWatch<T> {
        let (client, resource) = (self.client.clone(), gvr.clone());
        let list = move |params: ListParams| {
            let (client, resource) = (client.clone(), resource.clone());
            async move {
                let list = client.list(&resource, &params).await?;
                from_unstructured_list::<T>(list)
            }
            .boxed()
        };

        let (client, resource) = (self.client.clone(), gvr.clone());
        let watch = move |params: WatchParams, resource_version: String| {
            let (client, resource) = (client.clone(), resource.clone());
            async move { client.watch(&resource, &params, &resource_version).await }
        };

        ListWatch::new(list, as_structured_watcher::<T, _, _>(watch))
    }
}

#[async_trait]
impl<T: Duck> InformerFactory<T> for TypedInformerFactory<T> {
    async fn get(&self, gvr: &GroupVersionResource) -> Result<InformerPair<T>> {
        // Missing resources and RBAC denials surface here, not in the informer loop.
        self.client.list(gvr, &ListParams::default()).await?;

        let informer = Arc::new(SharedInformer::new(
            self.list_watch(gvr),
            self.resync_period,
        ));
        let lister = GenericLister::new(informer.indexer(), gvr.group_resource());

        informer.spawn(self.cancellation.clone());
        debug!(gvr = %gvr, "waiting for informer cache sync");
        if !informer.wait_for_cache_sync(&self.cancellation).await {
            return Err(DuckError::CacheSyncFailed {
                gvr: gvr.to_string(),
                type_name: std::any::type_name::<T>(),
            });
        }

        info!(gvr = %gvr, objects = informer.indexer().len(), "typed informer started");
        Ok((informer, lister))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::FakeDynamicClient;
    use crate::duck::AddressableType;
    use kube::api::{DynamicObject, WatchEvent};
    use kube::discovery::ApiResource;
    use serde_json::json;

    fn gvr() -> GroupVersionResource {
        GroupVersionResource::new("pkg.kduck.dev", "v2", "resources")
    }

    fn resource(namespace: &str, name: &str, hostname: &str) -> DynamicObject {
        let ar = ApiResource {
            group: "pkg.kduck.dev".to_string(),
            version: "v2".to_string(),
            api_version: "pkg.kduck.dev/v2".to_string(),
            kind: "Resource".to_string(),
            plural: "resources".to_string(),
        };
        DynamicObject::new(name, &ar)
            .within(namespace)
            .data(json!({"status": {"address": {"hostname": hostname}}}))
    }

    #[tokio::test]
    async fn test_simple_list() {
        let client = FakeDynamicClient::with_objects(gvr(), vec![resource("foo", "bar", "my_hostname")]);
        let cancel = CancellationToken::new();
        let factory = TypedInformerFactory::<AddressableType>::new(
            Arc::new(client),
            Duration::from_secs(1),
            cancel.clone(),
        );

        let (_informer, lister) = factory.get(&gvr()).await.unwrap();
        let got = lister.by_namespace("foo").get("bar").unwrap();
        assert_eq!(got.hostname(), Some("my_hostname"));
        cancel.cancel();
    }

    #[tokio::test]
    async fn test_invalid_resource_returns_list_error() {
        let client = FakeDynamicClient::new();
        client.fail_list(gvr(), "failed to get list");
        let factory = TypedInformerFactory::<AddressableType>::new(
            Arc::new(client),
            Duration::from_secs(1),
            CancellationToken::new(),
        );

        let err = factory.get(&gvr()).await.err().expect("get should fail");
        assert!(matches!(err, DuckError::Client(m) if m == "failed to get list"));
    }

    #[tokio::test]
    async fn test_cancelled_factory_fails_sync() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let factory = TypedInformerFactory::<AddressableType>::new(
            Arc::new(FakeDynamicClient::new()),
            Duration::ZERO,
            cancel,
        );

        let err = factory.get(&gvr()).await.err().expect("get should fail");
        assert!(matches!(err, DuckError::CacheSyncFailed { .. }));
        assert!(err.to_string().contains("resources.v2.pkg.kduck.dev"));
    }

    #[tokio::test]
    async fn test_watch_events_reach_lister() {
        let client = FakeDynamicClient::new();
        let cancel = CancellationToken::new();
        let factory = TypedInformerFactory::<AddressableType>::new(
            Arc::new(client.clone()),
            Duration::ZERO,
            cancel.clone(),
        );
        let (informer, lister) = factory.get(&gvr()).await.unwrap();

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        informer.add_event_handler(Arc::new(
            crate::informer::EventHandlerFuncs::new().with_add(move |obj: &AddressableType| {
                let _ = tx.send(obj.key());
            }),
        ));

        // The informer opens its watch right after the initial list.
        while client.open_watches(&gvr()) == 0 {
            tokio::task::yield_now().await;
        }
        client.emit(&gvr(), WatchEvent::Added(resource("foo", "late", "late.host")));

        assert_eq!(rx.recv().await.unwrap(), "foo/late");
        let got = lister.by_namespace("foo").get("late").unwrap();
        assert_eq!(got.hostname(), Some("late.host"));
        cancel.cancel();
    }
}
