use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use super::{InformerFactory, InformerPair};
use crate::client::GroupVersionResource;
use crate::duck::Duck;
use crate::error::Result;

type Slot<T> = Arc<tokio::sync::Mutex<Option<InformerPair<T>>>>;

/// Shares one informer per resource between all callers.
///
/// Concurrent first requests for the same resource wait for a single
/// delegate call. Failures are not cached: the next request retries.
pub struct CachedInformerFactory<T: Duck, F> {
    delegate: F,
    entries: Mutex<HashMap<GroupVersionResource, Slot<T>>>,
}

impl<T: Duck, F: InformerFactory<T>> CachedInformerFactory<T, F> {
    pub fn new(delegate: F) -> Self {
        Self {
            delegate,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, gvr: &GroupVersionResource) -> Slot<T> {
        self.entries.lock().entry(gvr.clone()).or_default().clone()
    }
}

#[async_trait]
impl<T: Duck, F: InformerFactory<T>> InformerFactory<T> for CachedInformerFactory<T, F> {
    async fn get(&self, gvr: &GroupVersionResource) -> Result<InformerPair<T>> {
        let slot = self.slot(gvr);
        let mut entry = slot.lock().await;
        if let Some((informer, lister)) = entry.as_ref() {
            return Ok((informer.clone(), lister.clone()));
        }

        debug!(gvr = %gvr, "creating shared informer");
        let (informer, lister) = self.delegate.get(gvr).await?;
        *entry = Some((informer.clone(), lister.clone()));
        Ok((informer, lister))
    }
}
