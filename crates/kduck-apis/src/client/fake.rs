//! In-memory dynamic client for testing
//!
//! Seeded objects are served by `list`, and events pushed through
//! [`FakeDynamicClient::emit`] are delivered to every open watch on the same
//! resource, in order, while also updating the seeded objects so that a
//! relist observes them.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use futures::channel::mpsc;
use kube::api::{DynamicObject, ListParams, WatchEvent, WatchParams};
use parking_lot::{Mutex, RwLock};

use super::{DynamicClient, GroupVersionResource, WatchStream};
use crate::duck::Duck;
use crate::error::{DuckError, Result};
use crate::unstructured::UnstructuredList;

type EventSender = mpsc::UnboundedSender<Result<WatchEvent<DynamicObject>>>;

/// In-memory dynamic client
#[derive(Clone, Default)]
pub struct FakeDynamicClient {
    /// Storage: resource -> objects
    objects: Arc<RwLock<HashMap<GroupVersionResource, Vec<DynamicObject>>>>,
    /// Resources whose list calls fail with the given message
    list_errors: Arc<RwLock<HashMap<GroupVersionResource, String>>>,
    /// Open watches per resource
    watchers: Arc<Mutex<HashMap<GroupVersionResource, Vec<EventSender>>>>,
    /// Track operation counts for assertions
    operations: Arc<RwLock<OperationCounts>>,
}

/// Counts of operations performed for testing assertions
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OperationCounts {
    pub lists: usize,
    pub watches: usize,
}

impl FakeDynamicClient {
    /// Create a new empty fake client
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with pre-populated objects for one resource
    pub fn with_objects(gvr: GroupVersionResource, objects: Vec<DynamicObject>) -> Self {
        let client = Self::new();
        client.objects.write().insert(gvr, objects);
        client
    }

    /// Make every list call for `gvr` fail with `message`
    pub fn fail_list(&self, gvr: GroupVersionResource, message: impl Into<String>) {
        self.list_errors.write().insert(gvr, message.into());
    }

    /// Deliver an event to open watches on `gvr` and apply it to the store.
    ///
    /// Returns the number of watches that received it.
    pub fn emit(&self, gvr: &GroupVersionResource, event: WatchEvent<DynamicObject>) -> usize {
        self.apply(gvr, &event);
        self.send(gvr, || Ok(event.clone()))
    }

    /// Deliver a transport-level error to open watches on `gvr`
    pub fn emit_error(&self, gvr: &GroupVersionResource, message: impl Into<String>) -> usize {
        let message = message.into();
        self.send(gvr, || Err(DuckError::Client(message.clone())))
    }

    /// End every open watch on `gvr`, as an API server timeout would
    pub fn close_watches(&self, gvr: &GroupVersionResource) {
        self.watchers.lock().remove(gvr);
    }

    /// Number of watches currently open on `gvr`
    pub fn open_watches(&self, gvr: &GroupVersionResource) -> usize {
        self.watchers
            .lock()
            .get(gvr)
            .map(|senders| senders.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }

    /// Get operation counts for assertions
    pub fn operation_counts(&self) -> OperationCounts {
        self.operations.read().clone()
    }

    fn send(
        &self,
        gvr: &GroupVersionResource,
        item: impl Fn() -> Result<WatchEvent<DynamicObject>>,
    ) -> usize {
        let mut watchers = self.watchers.lock();
        let Some(senders) = watchers.get_mut(gvr) else {
            return 0;
        };
        senders.retain(|tx| !tx.is_closed());
        senders
            .iter()
            .filter(|tx| tx.unbounded_send(item()).is_ok())
            .count()
    }

    fn apply(&self, gvr: &GroupVersionResource, event: &WatchEvent<DynamicObject>) {
        let mut objects = self.objects.write();
        let items = objects.entry(gvr.clone()).or_default();
        match event {
            WatchEvent::Added(obj) | WatchEvent::Modified(obj) => {
                let key = obj.key();
                match items.iter_mut().find(|existing| existing.key() == key) {
                    Some(existing) => *existing = obj.clone(),
                    None => items.push(obj.clone()),
                }
            }
            WatchEvent::Deleted(obj) => {
                let key = obj.key();
                items.retain(|existing| existing.key() != key);
            }
            WatchEvent::Bookmark(_) | WatchEvent::Error(_) => {}
        }
    }
}

#[async_trait]
impl DynamicClient for FakeDynamicClient {
    async fn list(
        &self,
        gvr: &GroupVersionResource,
        _params: &ListParams,
    ) -> Result<UnstructuredList> {
        self.operations.write().lists += 1;

        if let Some(message) = self.list_errors.read().get(gvr) {
            return Err(DuckError::Client(message.clone()));
        }

        let items = self.objects.read().get(gvr).cloned().unwrap_or_default();
        Ok(UnstructuredList {
            resource_version: None,
            items,
        })
    }

    async fn watch(
        &self,
        gvr: &GroupVersionResource,
        _params: &WatchParams,
        _resource_version: &str,
    ) -> Result<WatchStream<DynamicObject>> {
        self.operations.write().watches += 1;

        let (tx, rx) = mpsc::unbounded();
        self.watchers.lock().entry(gvr.clone()).or_default().push(tx);
        Ok(rx.boxed())
    }
}
