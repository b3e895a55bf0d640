//! kduck APIs - duck typing over the Kubernetes dynamic client
//!
//! This crate provides:
//! - **Duck Types**: Partial schemas (`KResource`, `AddressableType`) readable from any kind
//! - **Unstructured Conversion**: JSON round-trip between `DynamicObject` and duck types
//! - **Typed Watches**: Adapter turning unstructured watch streams into typed ones
//! - **Informers**: Local caches with event handlers, resync and listers
//! - **Informer Factories**: Typed, shared (cached) and handler-attaching (enqueue) factories
//! - **Verification**: Check that a concrete type really implements a duck type
//! - **Patches**: JSON patches and merge patches between object versions

pub mod client;
pub mod duck;
pub mod error;
pub mod factory;
pub mod informer;
pub mod patch;
pub mod unstructured;
pub mod verify;
pub mod watch;

pub use client::{
    DynamicClient, FakeDynamicClient, GroupResource, GroupVersionResource, KubeDynamicClient,
    OperationCounts, WatchStream,
};
pub use duck::{
    AddressStatus, Addressable, AddressableType, CONDITION_READY, CONDITION_SUCCEEDED, Condition,
    ConditionSeverity, ConditionStatus, Duck, KResource, Status, object_key,
};
pub use error::{DuckError, Result};
pub use factory::{
    CachedInformerFactory, EnqueueInformerFactory, InformerFactory, InformerPair,
    TypedInformerFactory,
};
pub use informer::{
    EventHandlerFuncs, GenericLister, Indexer, ListWatch, ListerWatcher, NamespaceLister,
    ResourceEventHandler, SharedInformer,
};
pub use patch::{create_merge_patch, create_patch};
pub use unstructured::{
    TypedList, UnstructuredList, from_unstructured, from_unstructured_list, to_unstructured,
};
pub use verify::verify_type;
pub use watch::{as_structured_watcher, structured_stream};
