use std::sync::Arc;

use async_trait::async_trait;

use super::{InformerFactory, InformerPair};
use crate::client::GroupVersionResource;
use crate::duck::Duck;
use crate::error::Result;
use crate::informer::ResourceEventHandler;

/// Registers `handler` on every informer its delegate hands out
pub struct EnqueueInformerFactory<T, F> {
    delegate: F,
    handler: Arc<dyn ResourceEventHandler<T>>,
}

impl<T: Duck, F: InformerFactory<T>> EnqueueInformerFactory<T, F> {
    pub fn new(delegate: F, handler: Arc<dyn ResourceEventHandler<T>>) -> Self {
        Self { delegate, handler }
    }
}

#[async_trait]
impl<T: Duck, F: InformerFactory<T>> InformerFactory<T> for EnqueueInformerFactory<T, F> {
    async fn get(&self, gvr: &GroupVersionResource) -> Result<InformerPair<T>> {
        let (informer, lister) = self.delegate.get(gvr).await?;
        informer.add_event_handler(self.handler.clone());
        Ok((informer, lister))
    }
}
