//! Conversion between unstructured objects and typed duck structs
//!
//! The dynamic client hands out [`DynamicObject`]s: a bag of JSON with
//! metadata pulled out. Converting to a duck type is a JSON round-trip, so a
//! duck type sees exactly the fields the API server returned and nothing
//! more.

use kube::api::{DynamicObject, ObjectList};
use kube::discovery::ApiResource;

use crate::duck::{Duck, object_key};
use crate::error::{DuckError, Result};

/// An unstructured list as returned by the dynamic client
#[derive(Debug, Clone, Default)]
pub struct UnstructuredList {
    /// Resource version the list was served at
    pub resource_version: Option<String>,
    pub items: Vec<DynamicObject>,
}

impl From<ObjectList<DynamicObject>> for UnstructuredList {
    fn from(list: ObjectList<DynamicObject>) -> Self {
        Self {
            resource_version: list.metadata.resource_version,
            items: list.items,
        }
    }
}

/// A typed list produced from an [`UnstructuredList`]
#[derive(Debug, Clone)]
pub struct TypedList<T> {
    pub resource_version: Option<String>,
    pub items: Vec<T>,
}

impl<T> Default for TypedList<T> {
    fn default() -> Self {
        Self {
            resource_version: None,
            items: Vec::new(),
        }
    }
}

/// Decode an unstructured object, keeping the raw decoder error.
///
/// The watch adapter reports this error text verbatim in error events.
pub(crate) fn decode<T: Duck>(obj: &DynamicObject) -> serde_json::Result<T> {
    let value = serde_json::to_value(obj)?;
    serde_json::from_value(value)
}

/// Convert an unstructured object into the duck type `T`
pub fn from_unstructured<T: Duck>(obj: &DynamicObject) -> Result<T> {
    decode(obj).map_err(|e| DuckError::Conversion {
        key: object_key(
            obj.metadata.namespace.as_deref(),
            obj.metadata.name.as_deref().unwrap_or_default(),
        ),
        type_name: std::any::type_name::<T>(),
        message: e.to_string(),
    })
}

/// Convert every item of an unstructured list, or of a kube
/// `ObjectList<DynamicObject>`. The first item that fails to decode aborts
/// the conversion.
pub fn from_unstructured_list<T: Duck>(
    list: impl Into<UnstructuredList>,
) -> Result<TypedList<T>> {
    let list = list.into();
    let items = list
        .items
        .iter()
        .map(from_unstructured)
        .collect::<Result<Vec<T>>>()?;

    Ok(TypedList {
        resource_version: list.resource_version,
        items,
    })
}

/// Convert a typed object back into an unstructured one for `resource`.
///
/// `apiVersion` and `kind` are always taken from `resource`, since duck
/// types do not carry them.
pub fn to_unstructured<T: Duck>(obj: &T, resource: &ApiResource) -> Result<DynamicObject> {
    let mut value = serde_json::to_value(obj)?;
    if let Some(map) = value.as_object_mut() {
        map.insert(
            "apiVersion".to_string(),
            serde_json::Value::String(resource.api_version.clone()),
        );
        map.insert(
            "kind".to_string(),
            serde_json::Value::String(resource.kind.clone()),
        );
    }
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duck::{AddressableType, KResource};
    use serde_json::json;

    fn resource() -> ApiResource {
        ApiResource {
            group: "pkg.kduck.dev".to_string(),
            version: "v2".to_string(),
            api_version: "pkg.kduck.dev/v2".to_string(),
            kind: "Resource".to_string(),
            plural: "resources".to_string(),
        }
    }

    fn addressable(name: &str, hostname: &str) -> DynamicObject {
        DynamicObject::new(name, &resource())
            .within("foo")
            .data(json!({"status": {"address": {"hostname": hostname}}}))
    }

    #[test]
    fn test_from_unstructured() {
        let typed: AddressableType = from_unstructured(&addressable("bar", "my_hostname")).unwrap();
        assert_eq!(typed.hostname(), Some("my_hostname"));
        assert_eq!(typed.metadata.name.as_deref(), Some("bar"));
        assert_eq!(typed.metadata.namespace.as_deref(), Some("foo"));
    }

    #[test]
    fn test_from_unstructured_reports_key() {
        let bad = DynamicObject::new("broken", &resource())
            .within("foo")
            .data(json!({"status": {"conditions": "not-a-list"}}));

        let err = from_unstructured::<KResource>(&bad).unwrap_err();
        match err {
            DuckError::Conversion { key, type_name, .. } => {
                assert_eq!(key, "foo/broken");
                assert!(type_name.ends_with("KResource"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_from_unstructured_list_keeps_resource_version() {
        let list = UnstructuredList {
            resource_version: Some("1234".to_string()),
            items: vec![addressable("a", "a.host"), addressable("b", "b.host")],
        };

        let typed: TypedList<AddressableType> = from_unstructured_list(list).unwrap();
        assert_eq!(typed.resource_version.as_deref(), Some("1234"));
        let hosts: Vec<_> = typed.items.iter().filter_map(|i| i.hostname()).collect();
        assert_eq!(hosts, vec!["a.host", "b.host"]);
    }

    #[test]
    fn test_from_object_list() {
        let list: ObjectList<DynamicObject> = serde_json::from_value(json!({
            "apiVersion": "pkg.kduck.dev/v2",
            "kind": "ResourceList",
            "metadata": {"resourceVersion": "77"},
            "items": [
                serde_json::to_value(addressable("a", "a.host")).unwrap(),
                serde_json::to_value(addressable("b", "b.host")).unwrap(),
            ]
        }))
        .unwrap();

        let typed: TypedList<AddressableType> = from_unstructured_list(list).unwrap();
        assert_eq!(typed.resource_version.as_deref(), Some("77"));
        let keys: Vec<_> = typed.items.iter().map(|i| i.key()).collect();
        assert_eq!(keys, vec!["foo/a", "foo/b"]);
    }

    #[test]
    fn test_to_unstructured_sets_type_meta() {
        let typed: AddressableType = from_unstructured(&addressable("bar", "h")).unwrap();
        let back = to_unstructured(&typed, &resource()).unwrap();

        let types = back.types.expect("type meta");
        assert_eq!(types.api_version, "pkg.kduck.dev/v2");
        assert_eq!(types.kind, "Resource");
        assert_eq!(back.data["status"]["address"]["hostname"], json!("h"));
    }
}
