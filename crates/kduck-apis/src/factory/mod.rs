//! Informer factories
//!
//! Factories hand out a running, synced informer and a lister for a
//! resource. They compose:
//!
//! - [`TypedInformerFactory`] builds informers over a [`DynamicClient`]
//!   whose objects are converted into a duck type;
//! - [`CachedInformerFactory`] shares one informer per resource;
//! - [`EnqueueInformerFactory`] attaches an event handler to whatever its
//!   delegate returns.
//!
//! [`DynamicClient`]: crate::client::DynamicClient

mod cached;
mod enqueue;
mod typed;

pub use cached::CachedInformerFactory;
pub use enqueue::EnqueueInformerFactory;
pub use typed::TypedInformerFactory;

use std::sync::Arc;

use async_trait::async_trait;

use crate::client::GroupVersionResource;
use crate::duck::Duck;
use crate::error::Result;
use crate::informer::{GenericLister, SharedInformer};

/// A synced informer together with a lister over its cache
pub type InformerPair<T> = (Arc<SharedInformer<T>>, GenericLister<T>);

/// Produces informers for arbitrary resources as duck type `T`
#[async_trait]
pub trait InformerFactory<T: Duck>: Send + Sync {
    async fn get(&self, gvr: &GroupVersionResource) -> Result<InformerPair<T>>;
}

#[async_trait]
impl<T: Duck, F: InformerFactory<T> + ?Sized> InformerFactory<T> for Arc<F> {
    async fn get(&self, gvr: &GroupVersionResource) -> Result<InformerPair<T>> {
        (**self).get(gvr).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use futures::{FutureExt, StreamExt};
    use parking_lot::Mutex;

    use super::{InformerFactory, InformerPair};
    use crate::client::GroupVersionResource;
    use crate::duck::KResource;
    use crate::error::{DuckError, Result};
    use crate::informer::{GenericLister, ListWatch, SharedInformer};
    use crate::unstructured::TypedList;

    /// An informer over a fixed, never-changing list
    pub fn static_informer(items: Vec<KResource>) -> Arc<SharedInformer<KResource>> {
        let lw = ListWatch::new(
            move |_params| {
                let items = items.clone();
                async move {
                    Ok(TypedList {
                        resource_version: Some("1".to_string()),
                        items,
                    })
                }
                .boxed()
            },
            |_params, _rv| async { Ok(futures::stream::pending().boxed()) }.boxed(),
        );
        Arc::new(SharedInformer::new(lw, Duration::ZERO))
    }

    pub fn gvr() -> GroupVersionResource {
        GroupVersionResource::new("testing.kduck.dev", "v3", "caches")
    }

    /// Returns a preset informer or error and counts calls
    pub struct FixedInformerFactory {
        pub informer: Arc<SharedInformer<KResource>>,
        pub errors: Mutex<Vec<String>>,
        pub calls: AtomicUsize,
        pub delay: Duration,
    }

    impl FixedInformerFactory {
        pub fn new(informer: Arc<SharedInformer<KResource>>) -> Self {
            Self {
                informer,
                errors: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
            }
        }

        /// Fail the next calls, one error message per call
        pub fn failing(self, errors: &[&str]) -> Self {
            *self.errors.lock() = errors.iter().rev().map(|e| e.to_string()).collect();
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl InformerFactory<KResource> for FixedInformerFactory {
        async fn get(&self, gvr: &GroupVersionResource) -> Result<InformerPair<KResource>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let error = self.errors.lock().pop();
            if let Some(message) = error {
                return Err(DuckError::Client(message));
            }
            let lister = GenericLister::new(self.informer.indexer(), gvr.group_resource());
            Ok((self.informer.clone(), lister))
        }
    }
}
