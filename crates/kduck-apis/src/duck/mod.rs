//! Duck types
//!
//! A duck type is a partial schema: any resource whose JSON carries the
//! fields of the duck type can be read through it, regardless of its
//! concrete API kind. Decoding is lenient (unknown fields are ignored and
//! missing fields take their defaults) so that an arbitrary CRD instance
//! converts cleanly.

mod addressable;
mod conditions;
mod kresource;

pub use addressable::{AddressStatus, Addressable, AddressableType};
pub use conditions::{
    CONDITION_READY, CONDITION_SUCCEEDED, Condition, ConditionSeverity, ConditionStatus, Status,
};
pub use kresource::KResource;

use std::fmt::Debug;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::DynamicObject;
use serde::{Serialize, de::DeserializeOwned};

/// A typed view over unstructured Kubernetes resources.
///
/// Implementors only need to expose their `metadata`; everything the
/// informer machinery needs (cache keys, resource versions) derives from it.
pub trait Duck: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static {
    /// Object metadata
    fn metadata(&self) -> &ObjectMeta;

    /// Object name, empty when unset
    fn name(&self) -> &str {
        self.metadata().name.as_deref().unwrap_or_default()
    }

    /// Object namespace (None for cluster-scoped objects)
    fn namespace(&self) -> Option<&str> {
        self.metadata().namespace.as_deref()
    }

    /// Resource version the object was observed at
    fn resource_version(&self) -> Option<&str> {
        self.metadata().resource_version.as_deref()
    }

    /// Cache key: `namespace/name`, or `name` for cluster-scoped objects
    fn key(&self) -> String {
        object_key(self.namespace(), self.name())
    }
}

/// Build a cache key from an optional namespace and a name
pub fn object_key(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => format!("{}/{}", ns, name),
        _ => name.to_string(),
    }
}

impl Duck for DynamicObject {
    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key() {
        assert_eq!(object_key(Some("foo"), "bar"), "foo/bar");
        assert_eq!(object_key(Some(""), "bar"), "bar");
        assert_eq!(object_key(None, "bar"), "bar");
    }

    #[test]
    fn test_duck_key_from_metadata() {
        let obj: KResource = serde_json::from_value(serde_json::json!({
            "metadata": {"namespace": "ns", "name": "thing", "resourceVersion": "42"}
        }))
        .unwrap();
        assert_eq!(obj.key(), "ns/thing");
        assert_eq!(obj.resource_version(), Some("42"));
    }

    #[test]
    fn test_dynamic_object_is_duck() {
        let obj: DynamicObject = serde_json::from_value(serde_json::json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {"name": "cluster-wide"}
        }))
        .unwrap();
        assert_eq!(obj.key(), "cluster-wide");
        assert_eq!(obj.namespace(), None);
    }
}
