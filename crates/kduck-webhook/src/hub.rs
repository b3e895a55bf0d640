//! Hub-and-spoke conversion
//!
//! Every kind designates one version as its hub. Objects are converted from
//! their stored version to the hub, then from the hub to the desired
//! version, so each non-hub version only needs converters to and from the
//! hub.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::conversion::ConversionController;
use crate::review::{ConversionRequest, ConversionResponse, split_api_version};

/// Converts objects of one spoke version to and from the hub version
pub trait VersionConverter: Send + Sync {
    /// Spoke object to hub object
    fn to_hub(&self, object: Value) -> Result<Value, String>;

    /// Hub object to spoke object
    fn from_hub(&self, hub: Value) -> Result<Value, String>;
}

/// An API group and kind
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKind {
    pub group: String,
    pub kind: String,
}

impl GroupKind {
    pub fn new(group: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            kind: kind.into(),
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            f.write_str(&self.kind)
        } else {
            write!(f, "{}.{}", self.kind, self.group)
        }
    }
}

/// Conversion setup for one kind
pub struct KindConversion {
    hub_version: String,
    spokes: HashMap<String, Box<dyn VersionConverter>>,
}

impl KindConversion {
    pub fn new(hub_version: impl Into<String>) -> Self {
        Self {
            hub_version: hub_version.into(),
            spokes: HashMap::new(),
        }
    }

    /// Add a non-hub version
    pub fn spoke(mut self, version: impl Into<String>, converter: impl VersionConverter + 'static) -> Self {
        self.spokes.insert(version.into(), Box::new(converter));
        self
    }

    fn to_hub(&self, version: &str, object: Value) -> Result<Value, String> {
        if version == self.hub_version {
            return Ok(object);
        }
        self.converter(version)?.to_hub(object)
    }

    fn from_hub(&self, version: &str, hub: Value) -> Result<Value, String> {
        if version == self.hub_version {
            return Ok(hub);
        }
        self.converter(version)?.from_hub(hub)
    }

    fn converter(&self, version: &str) -> Result<&dyn VersionConverter, String> {
        self.spokes
            .get(version)
            .map(|c| &**c)
            .ok_or_else(|| format!("no conversion registered for version {:?}", version))
    }
}

/// [`ConversionController`] converting through each kind's hub version
pub struct HubConversion {
    path: String,
    kinds: HashMap<GroupKind, KindConversion>,
}

impl HubConversion {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kinds: HashMap::new(),
        }
    }

    pub fn kind(mut self, group_kind: GroupKind, conversion: KindConversion) -> Self {
        self.kinds.insert(group_kind, conversion);
        self
    }

    fn convert_object(&self, object: Value, desired_api_version: &str) -> Result<Value, String> {
        let api_version = object
            .get("apiVersion")
            .and_then(Value::as_str)
            .ok_or("object has no apiVersion")?
            .to_string();
        if api_version == desired_api_version {
            return Ok(object);
        }

        let kind = object
            .get("kind")
            .and_then(Value::as_str)
            .ok_or("object has no kind")?;
        let (group, version) = split_api_version(&api_version);
        let (desired_group, desired_version) = split_api_version(desired_api_version);
        if group != desired_group {
            return Err(format!(
                "cannot convert {} to {}: groups differ",
                api_version, desired_api_version
            ));
        }

        let group_kind = GroupKind::new(group, kind);
        let conversion = self
            .kinds
            .get(&group_kind)
            .ok_or_else(|| format!("no conversion registered for kind {}", group_kind))?;

        let hub = conversion.to_hub(version, object)?;
        let mut converted = conversion.from_hub(desired_version, hub)?;
        if let Some(fields) = converted.as_object_mut() {
            fields.insert(
                "apiVersion".to_string(),
                Value::String(desired_api_version.to_string()),
            );
        }
        Ok(converted)
    }
}

#[async_trait]
impl ConversionController for HubConversion {
    fn path(&self) -> &str {
        &self.path
    }

    async fn convert(&self, request: &ConversionRequest) -> ConversionResponse {
        let mut converted = Vec::with_capacity(request.objects.len());
        for (index, object) in request.objects.iter().enumerate() {
            match self.convert_object(object.clone(), &request.desired_api_version) {
                Ok(object) => converted.push(object),
                Err(message) => {
                    warn!(uid = %request.uid, index, error = %message, "conversion failed");
                    return ConversionResponse::failure(
                        &request.uid,
                        format!("conversion of object {} failed: {}", index, message),
                    );
                }
            }
        }
        ConversionResponse::success(&request.uid, converted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// v1alpha1 calls `spec.replicas` `spec.count`
    struct Alpha;

    impl VersionConverter for Alpha {
        fn to_hub(&self, mut object: Value) -> Result<Value, String> {
            let spec = object["spec"].as_object_mut().ok_or("spec missing")?;
            if let Some(count) = spec.remove("count") {
                spec.insert("replicas".to_string(), count);
            }
            Ok(object)
        }

        fn from_hub(&self, mut hub: Value) -> Result<Value, String> {
            let spec = hub["spec"].as_object_mut().ok_or("spec missing")?;
            if let Some(replicas) = spec.remove("replicas") {
                spec.insert("count".to_string(), replicas);
            }
            Ok(hub)
        }
    }

    fn controller() -> HubConversion {
        HubConversion::new("/convert").kind(
            GroupKind::new("example.com", "Widget"),
            KindConversion::new("v1").spoke("v1alpha1", Alpha),
        )
    }

    fn request(desired: &str, objects: Vec<Value>) -> ConversionRequest {
        ConversionRequest {
            uid: "some-uid".to_string(),
            desired_api_version: desired.to_string(),
            objects,
        }
    }

    #[tokio::test]
    async fn test_spoke_to_hub_and_back() {
        let alpha = json!({"apiVersion": "example.com/v1alpha1", "kind": "Widget", "spec": {"count": 3}});
        let hub = json!({"apiVersion": "example.com/v1", "kind": "Widget", "spec": {"replicas": 2}});

        let response = controller()
            .convert(&request("example.com/v1", vec![alpha, hub.clone()]))
            .await;
        assert_eq!(response.uid, "some-uid");
        assert_eq!(response.result.summary(), "success");
        assert_eq!(
            response.converted_objects,
            vec![
                json!({"apiVersion": "example.com/v1", "kind": "Widget", "spec": {"replicas": 3}}),
                hub.clone(),
            ]
        );

        let response = controller()
            .convert(&request("example.com/v1alpha1", vec![hub]))
            .await;
        assert_eq!(
            response.converted_objects,
            vec![json!({"apiVersion": "example.com/v1alpha1", "kind": "Widget", "spec": {"count": 2}})]
        );
    }

    #[tokio::test]
    async fn test_unknown_kind_fails() {
        let gadget = json!({"apiVersion": "example.com/v1alpha1", "kind": "Gadget", "spec": {}});
        let response = controller()
            .convert(&request("example.com/v1", vec![gadget]))
            .await;
        assert_eq!(response.uid, "some-uid");
        assert_eq!(response.result.summary(), "failure");
        assert!(response.result.message.contains("Gadget.example.com"));
        assert!(response.converted_objects.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_version_fails() {
        let widget = json!({"apiVersion": "example.com/v1", "kind": "Widget", "spec": {}});
        let response = controller()
            .convert(&request("example.com/v2", vec![widget]))
            .await;
        assert_eq!(response.result.summary(), "failure");
        assert!(response.result.message.contains("\"v2\""));
    }
}
