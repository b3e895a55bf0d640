//! Addressable: resources that publish an address in their status

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};

use super::{Duck, Status};

/// Where a resource can be reached
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Addressable {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Bare hostname, kept for resources that predate `url`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    #[serde(rename = "CACerts", skip_serializing_if = "Option::is_none")]
    pub ca_certs: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
}

impl Addressable {
    /// The URL if set, otherwise an `http://` URL built from the hostname
    pub fn effective_url(&self) -> Option<String> {
        self.url
            .clone()
            .or_else(|| self.hostname.as_ref().map(|h| format!("http://{}", h)))
    }
}

/// Status shape of an addressable resource
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AddressStatus {
    #[serde(flatten)]
    pub status: Status,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Addressable>,
}

/// Any resource exposing `status.address`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressableType {
    pub metadata: ObjectMeta,
    pub status: AddressStatus,
}

impl AddressableType {
    /// Hostname published in `status.address`, if any
    pub fn hostname(&self) -> Option<&str> {
        self.status.address.as_ref()?.hostname.as_deref()
    }
}

impl Duck for AddressableType {
    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_foreign_kind() {
        let obj: AddressableType = serde_json::from_value(serde_json::json!({
            "apiVersion": "serving.example.dev/v1",
            "kind": "Route",
            "metadata": {"namespace": "foo", "name": "bar"},
            "spec": {"traffic": [{"percent": 100}]},
            "status": {
                "observedGeneration": 3,
                "address": {"hostname": "bar.foo.svc", "CACerts": "pem"}
            }
        }))
        .unwrap();

        assert_eq!(obj.hostname(), Some("bar.foo.svc"));
        assert_eq!(obj.status.status.observed_generation, 3);
        assert_eq!(obj.status.address.as_ref().unwrap().ca_certs.as_deref(), Some("pem"));
    }

    #[test]
    fn test_effective_url() {
        let with_host = Addressable {
            hostname: Some("svc.ns".to_string()),
            ..Default::default()
        };
        assert_eq!(with_host.effective_url().as_deref(), Some("http://svc.ns"));

        let with_url = Addressable {
            url: Some("https://svc.ns".to_string()),
            hostname: Some("ignored".to_string()),
            ..Default::default()
        };
        assert_eq!(with_url.effective_url().as_deref(), Some("https://svc.ns"));
        assert_eq!(Addressable::default().effective_url(), None);
    }

    #[test]
    fn test_empty_object_decodes_to_default() {
        let obj: AddressableType = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(obj, AddressableType::default());
        assert_eq!(obj.hostname(), None);
    }
}
