//! Typed watches over the dynamic client
//!
//! [`as_structured_watcher`] turns a function that opens an unstructured
//! watch into one that opens a typed watch. The conversion keeps watch
//! semantics intact:
//!
//! - events come out in the order they went in;
//! - the typed stream ends when the unstructured stream ends, and dropping
//!   the typed stream drops (stops) the unstructured one;
//! - `Error` events and transport errors pass through untouched, as do
//!   errors returned while opening the watch;
//! - an object that does not decode into `T` is replaced by an `Error`
//!   event whose message is the decoder error.

use std::future::Future;

use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use kube::api::{DynamicObject, WatchEvent, WatchParams};
use kube::error::ErrorResponse;
use tracing::warn;

use crate::client::WatchStream;
use crate::duck::Duck;
use crate::error::Result;
use crate::unstructured::decode;

/// Status reported for objects that fail to decode
pub const CONVERSION_FAILURE_STATUS: &str = "Failure";
pub const CONVERSION_FAILURE_REASON: &str = "InternalError";
pub const CONVERSION_FAILURE_CODE: u16 = 500;

/// Convert a stream of unstructured events into typed events
pub fn structured_stream<T: Duck>(source: WatchStream<DynamicObject>) -> WatchStream<T> {
    source
        .map(|item| item.map(convert_event::<T>))
        .boxed()
}

/// Wrap an unstructured watch function so it produces typed watches.
///
/// The returned function takes the same arguments as `watch`.
pub fn as_structured_watcher<T, F, Fut>(
    watch: F,
) -> impl Fn(WatchParams, String) -> BoxFuture<'static, Result<WatchStream<T>>> + Clone + Send + Sync
where
    T: Duck,
    F: Fn(WatchParams, String) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<WatchStream<DynamicObject>>> + Send + 'static,
{
    move |params, resource_version| {
        let opened = watch(params, resource_version);
        async move { opened.await.map(structured_stream::<T>) }.boxed()
    }
}

fn convert_event<T: Duck>(event: WatchEvent<DynamicObject>) -> WatchEvent<T> {
    match event {
        WatchEvent::Added(obj) => convert_object(&obj, WatchEvent::Added),
        WatchEvent::Modified(obj) => convert_object(&obj, WatchEvent::Modified),
        WatchEvent::Deleted(obj) => convert_object(&obj, WatchEvent::Deleted),
        WatchEvent::Bookmark(bookmark) => WatchEvent::Bookmark(bookmark),
        WatchEvent::Error(status) => WatchEvent::Error(status),
    }
}

fn convert_object<T: Duck>(
    obj: &DynamicObject,
    wrap: fn(T) -> WatchEvent<T>,
) -> WatchEvent<T> {
    match decode::<T>(obj) {
        Ok(typed) => wrap(typed),
        Err(e) => {
            warn!(
                name = ?obj.metadata.name,
                namespace = ?obj.metadata.namespace,
                error = %e,
                "failed to convert watched object"
            );
            WatchEvent::Error(conversion_failure(e.to_string()))
        }
    }
}

fn conversion_failure(message: String) -> ErrorResponse {
    ErrorResponse {
        status: CONVERSION_FAILURE_STATUS.to_string(),
        message,
        reason: CONVERSION_FAILURE_REASON.to_string(),
        code: CONVERSION_FAILURE_CODE,
    }
}
