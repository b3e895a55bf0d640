//! Thread-safe object cache keyed by `namespace/name`

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::duck::Duck;

/// Local cache of the objects an informer has observed
#[derive(Debug)]
pub struct Indexer<T> {
    items: RwLock<BTreeMap<String, Arc<T>>>,
}

impl<T> Default for Indexer<T> {
    fn default() -> Self {
        Self {
            items: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<T: Duck> Indexer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an object. Returns the previous version, if any.
    pub fn add(&self, obj: T) -> Option<Arc<T>> {
        self.items.write().insert(obj.key(), Arc::new(obj))
    }

    /// Same as [`Indexer::add`]; kept separate to mirror watch verbs
    pub fn update(&self, obj: T) -> Option<Arc<T>> {
        self.add(obj)
    }

    /// Remove an object by its key. Returns the cached version, if any.
    pub fn delete(&self, obj: &T) -> Option<Arc<T>> {
        self.items.write().remove(&obj.key())
    }

    /// Replace the whole cache content, returning what was there before
    pub fn replace(&self, objects: Vec<T>) -> BTreeMap<String, Arc<T>> {
        let fresh = objects
            .into_iter()
            .map(|obj| (obj.key(), Arc::new(obj)))
            .collect();
        std::mem::replace(&mut *self.items.write(), fresh)
    }

    pub fn get_by_key(&self, key: &str) -> Option<Arc<T>> {
        self.items.read().get(key).cloned()
    }

    /// All cached objects, ordered by key
    pub fn list(&self) -> Vec<Arc<T>> {
        self.items.read().values().cloned().collect()
    }

    /// Objects in one namespace
    pub fn by_namespace(&self, namespace: &str) -> Vec<Arc<T>> {
        self.items
            .read()
            .values()
            .filter(|obj| obj.namespace() == Some(namespace))
            .cloned()
            .collect()
    }

    pub fn keys(&self) -> Vec<String> {
        self.items.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duck::KResource;

    fn obj(namespace: Option<&str>, name: &str) -> KResource {
        let mut obj = KResource::default();
        obj.metadata.namespace = namespace.map(str::to_string);
        obj.metadata.name = Some(name.to_string());
        obj
    }

    #[test]
    fn test_add_update_delete() {
        let indexer = Indexer::new();
        assert!(indexer.add(obj(Some("ns"), "a")).is_none());
        assert!(indexer.update(obj(Some("ns"), "a")).is_some());
        assert_eq!(indexer.len(), 1);

        assert!(indexer.delete(&obj(Some("ns"), "a")).is_some());
        assert!(indexer.delete(&obj(Some("ns"), "a")).is_none());
        assert!(indexer.is_empty());
    }

    #[test]
    fn test_replace_returns_previous() {
        let indexer = Indexer::new();
        indexer.add(obj(Some("ns"), "old"));

        let previous = indexer.replace(vec![obj(Some("ns"), "new"), obj(None, "cluster")]);
        assert_eq!(previous.keys().collect::<Vec<_>>(), vec!["ns/old"]);
        assert_eq!(indexer.keys(), vec!["cluster", "ns/new"]);
    }

    #[test]
    fn test_by_namespace() {
        let indexer = Indexer::new();
        indexer.add(obj(Some("a"), "one"));
        indexer.add(obj(Some("a"), "two"));
        indexer.add(obj(Some("b"), "three"));
        indexer.add(obj(None, "four"));

        let names: Vec<_> = indexer
            .by_namespace("a")
            .iter()
            .map(|o| o.name().to_string())
            .collect();
        assert_eq!(names, vec!["one", "two"]);
        assert!(indexer.get_by_key("four").is_some());
    }
}
