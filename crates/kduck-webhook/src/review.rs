//! ConversionReview wire types (`apiextensions.k8s.io/v1`)

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// apiVersion of the review envelope
pub const REVIEW_API_VERSION: &str = "apiextensions.k8s.io/v1";

/// kind of the review envelope
pub const REVIEW_KIND: &str = "ConversionReview";

/// Envelope the API server posts to a conversion webhook, and the reply
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionReview {
    #[serde(default)]
    pub api_version: String,

    #[serde(default)]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<ConversionRequest>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ConversionResponse>,
}

/// Objects to convert and the version to convert them to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionRequest {
    pub uid: String,

    #[serde(rename = "desiredAPIVersion")]
    pub desired_api_version: String,

    #[serde(default)]
    pub objects: Vec<Value>,
}

/// Converted objects, in request order, and the outcome
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResponse {
    pub uid: String,

    #[serde(default)]
    pub converted_objects: Vec<Value>,

    #[serde(default)]
    pub result: Status,
}

impl ConversionResponse {
    /// A successful response carrying `converted_objects`
    pub fn success(uid: impl Into<String>, converted_objects: Vec<Value>) -> Self {
        Self {
            uid: uid.into(),
            converted_objects,
            result: Status::success(),
        }
    }

    /// A failed response without converted objects
    pub fn failure(uid: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            converted_objects: Vec::new(),
            result: Status::failure(message),
        }
    }
}

/// Outcome of an operation (`meta/v1` Status, trimmed to what conversion uses)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Status {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusSummary>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub code: u16,
}

fn is_zero(code: &u16) -> bool {
    *code == 0
}

impl Status {
    pub fn success() -> Self {
        Self {
            status: Some(StatusSummary::Success),
            ..Default::default()
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: Some(StatusSummary::Failure),
            message: message.into(),
            ..Default::default()
        }
    }

    /// Lowercase status name, empty when unset
    pub fn summary(&self) -> &'static str {
        match self.status {
            Some(StatusSummary::Success) => "success",
            Some(StatusSummary::Failure) => "failure",
            None => "",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusSummary {
    Success,
    Failure,
}

/// Split an apiVersion into group and version; the core group is empty
pub fn split_api_version(api_version: &str) -> (&str, &str) {
    match api_version.split_once('/') {
        Some((group, version)) => (group, version),
        None => ("", api_version),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_request() {
        let review: ConversionReview = serde_json::from_value(json!({
            "apiVersion": "apiextensions.k8s.io/v1",
            "kind": "ConversionReview",
            "request": {
                "uid": "some-uid",
                "desiredAPIVersion": "example.com/v1",
                "objects": [{"apiVersion": "example.com/v1alpha1", "kind": "Widget"}]
            }
        }))
        .unwrap();

        let request = review.request.unwrap();
        assert_eq!(request.desired_api_version, "example.com/v1");
        assert_eq!(request.objects.len(), 1);
        assert!(review.response.is_none());
    }

    #[test]
    fn test_encode_response() {
        let response = ConversionResponse::failure("some-uid", "no converter");
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "uid": "some-uid",
                "convertedObjects": [],
                "result": {"status": "Failure", "message": "no converter"}
            })
        );
        assert_eq!(response.result.summary(), "failure");
    }

    #[test]
    fn test_split_api_version() {
        assert_eq!(split_api_version("example.com/v1"), ("example.com", "v1"));
        assert_eq!(split_api_version("v1"), ("", "v1"));
    }
}
