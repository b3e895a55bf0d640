//! Shared informers
//!
//! An informer keeps a local, eventually consistent mirror of a resource
//! collection: it lists once, then follows a watch from the list's
//! resource version, relisting whenever the watch ends or fails. Every
//! change to the cache is reported to the registered
//! [`ResourceEventHandler`]s in the order it was observed.

mod handler;
mod indexer;
mod lister;

pub use handler::{EventHandlerFuncs, ResourceEventHandler};
pub use indexer::Indexer;
pub use lister::{GenericLister, NamespaceLister};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use futures::future::BoxFuture;
use kube::api::{ListParams, WatchEvent, WatchParams};
use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::WatchStream;
use crate::duck::Duck;
use crate::error::{DuckError, Result};
use crate::unstructured::TypedList;

/// Delay before the first relist after a failure
const INITIAL_BACKOFF: Duration = Duration::from_millis(800);

/// Upper bound for the relist delay
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Source of typed lists and watches for an informer
#[async_trait]
pub trait ListerWatcher<T>: Send + Sync {
    async fn list(&self, params: &ListParams) -> Result<TypedList<T>>;

    async fn watch(&self, params: &WatchParams, resource_version: &str)
    -> Result<WatchStream<T>>;
}

type ListFn<T> = Arc<dyn Fn(ListParams) -> BoxFuture<'static, Result<TypedList<T>>> + Send + Sync>;
type WatchFn<T> =
    Arc<dyn Fn(WatchParams, String) -> BoxFuture<'static, Result<WatchStream<T>>> + Send + Sync>;

/// [`ListerWatcher`] assembled from a list function and a watch function
pub struct ListWatch<T> {
    list: ListFn<T>,
    watch: WatchFn<T>,
}

impl<T> ListWatch<T> {
    pub fn new<L, W>(list: L, watch: W) -> Self
    where
        L: Fn(ListParams) -> BoxFuture<'static, Result<TypedList<T>>> + Send + Sync + 'static,
        W: Fn(WatchParams, String) -> BoxFuture<'static, Result<WatchStream<T>>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            list: Arc::new(list),
            watch: Arc::new(watch),
        }
    }
}

#[async_trait]
impl<T: Duck> ListerWatcher<T> for ListWatch<T> {
    async fn list(&self, params: &ListParams) -> Result<TypedList<T>> {
        (self.list)(params.clone()).await
    }

    async fn watch(
        &self,
        params: &WatchParams,
        resource_version: &str,
    ) -> Result<WatchStream<T>> {
        (self.watch)(params.clone(), resource_version.to_string()).await
    }
}

/// Why a watch session ended without an error
enum WatchEnd {
    Cancelled,
    Relist,
}

/// A cache of one resource collection plus the handlers watching it
pub struct SharedInformer<T: Duck> {
    lister_watcher: Arc<dyn ListerWatcher<T>>,
    indexer: Arc<Indexer<T>>,
    handlers: RwLock<Vec<Arc<dyn ResourceEventHandler<T>>>>,
    /// Held while the cache changes and handlers are notified, and while a
    /// handler is registered, so a new handler misses no event.
    dispatch: Mutex<()>,
    resync_period: Duration,
    synced: watch::Sender<bool>,
    last_sync_resource_version: RwLock<Option<String>>,
}

impl<T: Duck> SharedInformer<T> {
    /// Create an informer. A zero `resync_period` disables resyncs.
    pub fn new(lister_watcher: impl ListerWatcher<T> + 'static, resync_period: Duration) -> Self {
        let (synced, _) = watch::channel(false);
        Self {
            lister_watcher: Arc::new(lister_watcher),
            indexer: Arc::new(Indexer::new()),
            handlers: RwLock::new(Vec::new()),
            dispatch: Mutex::new(()),
            resync_period,
            synced,
            last_sync_resource_version: RwLock::new(None),
        }
    }

    /// The cache backing this informer
    pub fn indexer(&self) -> Arc<Indexer<T>> {
        self.indexer.clone()
    }

    /// Register a handler.
    ///
    /// A handler added after the initial list receives an `on_add` for
    /// every object already cached, then every later event. Must not be
    /// called from inside a handler callback.
    pub fn add_event_handler(&self, handler: Arc<dyn ResourceEventHandler<T>>) {
        let _dispatch = self.dispatch.lock();
        if self.has_synced() {
            for obj in self.indexer.list() {
                handler.on_add(&obj);
            }
        }
        self.handlers.write().push(handler);
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.read().len()
    }

    /// Whether the initial list has been loaded into the cache
    pub fn has_synced(&self) -> bool {
        *self.synced.borrow()
    }

    /// Resource version of the most recently observed list or event
    pub fn last_sync_resource_version(&self) -> Option<String> {
        self.last_sync_resource_version.read().clone()
    }

    /// Wait until the cache is synced. Returns false if `cancel` fires first.
    pub async fn wait_for_cache_sync(&self, cancel: &CancellationToken) -> bool {
        let mut synced = self.synced.subscribe();
        loop {
            if *synced.borrow_and_update() {
                return true;
            }
            tokio::select! {
                changed = synced.changed() => {
                    if changed.is_err() {
                        return false;
                    }
                }
                _ = cancel.cancelled() => return false,
            }
        }
    }

    /// Run the informer on a background task until `cancel` fires
    pub fn spawn(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let informer = self.clone();
        tokio::spawn(async move { informer.run(cancel).await })
    }

    /// List and watch until `cancel` fires, relisting with backoff on failure
    pub async fn run(&self, cancel: CancellationToken) {
        let mut backoff = INITIAL_BACKOFF;
        loop {
            match self.list_and_watch(&cancel).await {
                Ok(WatchEnd::Cancelled) => break,
                Ok(WatchEnd::Relist) => backoff = INITIAL_BACKOFF,
                Err(e) => {
                    warn!(error = %e, retry_in = ?backoff, "informer list/watch failed");
                    tokio::select! {
                        _ = tokio::time::sleep(backoff) => {}
                        _ = cancel.cancelled() => break,
                    }
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
            }
        }
        debug!("informer stopped");
    }

    async fn list_and_watch(&self, cancel: &CancellationToken) -> Result<WatchEnd> {
        let list_params = ListParams::default();
        let list = tokio::select! {
            list = self.lister_watcher.list(&list_params) => list?,
            _ = cancel.cancelled() => return Ok(WatchEnd::Cancelled),
        };

        let mut resource_version = list.resource_version.clone().unwrap_or_default();
        self.replace(list.items, &resource_version);

        let params = WatchParams::default();
        let mut stream = tokio::select! {
            stream = self.lister_watcher.watch(&params, &resource_version) => stream?,
            _ = cancel.cancelled() => return Ok(WatchEnd::Cancelled),
        };

        let mut resync = self.resync_interval();
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(WatchEnd::Cancelled),
                _ = next_resync(&mut resync) => self.resync(),
                item = stream.next() => match item {
                    None => {
                        debug!(resource_version = %resource_version, "watch closed, relisting");
                        return Ok(WatchEnd::Relist);
                    }
                    Some(Err(e)) => return Err(e),
                    Some(Ok(event)) => match self.handle_event(event) {
                        Ok(Some(rv)) => resource_version = rv,
                        Ok(None) => {}
                        Err(e) if e.is_gone() => {
                            debug!(error = %e, "watch expired, relisting");
                            return Ok(WatchEnd::Relist);
                        }
                        Err(e) => return Err(e),
                    },
                },
            }
        }
    }

    /// Apply one watch event; returns the resource version it carried.
    fn handle_event(&self, event: WatchEvent<T>) -> Result<Option<String>> {
        let _dispatch = self.dispatch.lock();
        let rv = match event {
            WatchEvent::Added(obj) => {
                let rv = obj.resource_version().map(str::to_string);
                let new = Arc::new(obj.clone());
                match self.indexer.add(obj) {
                    Some(old) => self.notify(|h| h.on_update(&old, &new)),
                    None => self.notify(|h| h.on_add(&new)),
                }
                rv
            }
            WatchEvent::Modified(obj) => {
                let rv = obj.resource_version().map(str::to_string);
                let new = Arc::new(obj.clone());
                match self.indexer.update(obj) {
                    Some(old) => self.notify(|h| h.on_update(&old, &new)),
                    None => self.notify(|h| h.on_add(&new)),
                }
                rv
            }
            WatchEvent::Deleted(obj) => {
                let rv = obj.resource_version().map(str::to_string);
                let cached = self.indexer.delete(&obj);
                match cached {
                    Some(last) => self.notify(|h| h.on_delete(&last)),
                    None => self.notify(|h| h.on_delete(&obj)),
                }
                rv
            }
            WatchEvent::Bookmark(bookmark) => Some(bookmark.metadata.resource_version),
            WatchEvent::Error(status) => {
                return Err(DuckError::Watch {
                    code: status.code,
                    reason: status.reason,
                    message: status.message,
                });
            }
        };

        if let Some(rv) = &rv {
            self.set_resource_version(rv);
        }
        Ok(rv)
    }

    /// Swap in a fresh list, reporting adds, updates and deletes against
    /// the previous cache content, and mark the cache synced.
    fn replace(&self, items: Vec<T>, resource_version: &str) {
        let _dispatch = self.dispatch.lock();
        let previous = self.indexer.replace(items);
        for obj in self.indexer.list() {
            match previous.get(&obj.key()) {
                Some(old) => self.notify(|h| h.on_update(old, &obj)),
                None => self.notify(|h| h.on_add(&obj)),
            }
        }
        for (key, old) in &previous {
            if self.indexer.get_by_key(key).is_none() {
                self.notify(|h| h.on_delete(old));
            }
        }
        self.set_resource_version(resource_version);
        if !self.synced.send_replace(true) {
            info!(objects = self.indexer.len(), "informer cache synced");
        }
    }

    /// Re-deliver every cached object as an update
    fn resync(&self) {
        let _dispatch = self.dispatch.lock();
        let objects = self.indexer.list();
        debug!(objects = objects.len(), "informer resync");
        for obj in objects {
            self.notify(|h| h.on_update(&obj, &obj));
        }
    }

    fn notify(&self, f: impl Fn(&dyn ResourceEventHandler<T>)) {
        let handlers = self.handlers.read().clone();
        for handler in &handlers {
            f(handler.as_ref());
        }
    }

    fn set_resource_version(&self, rv: &str) {
        if !rv.is_empty() {
            *self.last_sync_resource_version.write() = Some(rv.to_string());
        }
    }

    fn resync_interval(&self) -> Option<Interval> {
        if self.resync_period.is_zero() {
            return None;
        }
        let mut interval =
            tokio::time::interval_at(Instant::now() + self.resync_period, self.resync_period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Some(interval)
    }
}

async fn next_resync(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
