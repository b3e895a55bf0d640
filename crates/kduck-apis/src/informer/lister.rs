//! Read-only views over an informer's cache

use std::sync::Arc;

use super::Indexer;
use crate::client::GroupResource;
use crate::duck::{Duck, object_key};
use crate::error::{DuckError, Result};

/// Lists and gets objects of one resource from a local cache
pub struct GenericLister<T> {
    indexer: Arc<Indexer<T>>,
    resource: GroupResource,
}

impl<T> Clone for GenericLister<T> {
    fn clone(&self) -> Self {
        Self {
            indexer: self.indexer.clone(),
            resource: self.resource.clone(),
        }
    }
}

impl<T: Duck> GenericLister<T> {
    pub fn new(indexer: Arc<Indexer<T>>, resource: GroupResource) -> Self {
        Self { indexer, resource }
    }

    /// Every cached object across namespaces
    pub fn list(&self) -> Vec<Arc<T>> {
        self.indexer.list()
    }

    /// Get a cluster-scoped object by name
    pub fn get(&self, name: &str) -> Result<Arc<T>> {
        self.lookup(None, name)
    }

    /// Restrict lookups to one namespace
    pub fn by_namespace(&self, namespace: impl Into<String>) -> NamespaceLister<T> {
        NamespaceLister {
            lister: self.clone(),
            namespace: namespace.into(),
        }
    }

    fn lookup(&self, namespace: Option<&str>, name: &str) -> Result<Arc<T>> {
        self.indexer
            .get_by_key(&object_key(namespace, name))
            .ok_or_else(|| DuckError::NotFound {
                resource: self.resource.to_string(),
                name: name.to_string(),
            })
    }
}

/// Lister restricted to one namespace
pub struct NamespaceLister<T> {
    lister: GenericLister<T>,
    namespace: String,
}

impl<T: Duck> NamespaceLister<T> {
    pub fn list(&self) -> Vec<Arc<T>> {
        self.lister.indexer.by_namespace(&self.namespace)
    }

    pub fn get(&self, name: &str) -> Result<Arc<T>> {
        self.lister.lookup(Some(&self.namespace), name)
    }
}
