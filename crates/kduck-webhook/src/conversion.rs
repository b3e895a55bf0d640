//! Conversion controllers and their HTTP handler

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use tracing::{debug, warn};

use crate::error::{Result, WebhookError};
use crate::review::{ConversionRequest, ConversionResponse, ConversionReview};
use crate::stats;

/// Converts custom resources between the versions of a CRD
#[async_trait]
pub trait ConversionController: Send + Sync {
    /// HTTP path the controller is served at
    fn path(&self) -> &str;

    /// Convert every object of `request` to its desired version
    async fn convert(&self, request: &ConversionRequest) -> ConversionResponse;
}

/// Serve one conversion review
pub(crate) async fn handle_conversion(
    State(controller): State<Arc<dyn ConversionController>>,
    body: Bytes,
) -> Result<Json<ConversionReview>> {
    let started = Instant::now();

    let review: ConversionReview = serde_json::from_slice(&body).map_err(|e| {
        warn!(path = controller.path(), error = %e, "could not decode conversion review");
        WebhookError::InvalidReview(format!("could not decode body: {}", e))
    })?;
    let request = review.request.as_ref().ok_or_else(|| {
        WebhookError::InvalidReview("conversion review has no request".to_string())
    })?;

    let response = controller.convert(request).await;
    let status = response.result.summary();
    debug!(
        uid = %request.uid,
        desired = %request.desired_api_version,
        objects = request.objects.len(),
        status,
        "handled conversion review"
    );
    stats::record_conversion(&request.desired_api_version, status, started.elapsed());

    // The reply carries the type meta the API server sent.
    Ok(Json(ConversionReview {
        api_version: review.api_version.clone(),
        kind: review.kind.clone(),
        request: None,
        response: Some(response),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::WebhookOptions;
    use crate::review::{REVIEW_API_VERSION, REVIEW_KIND};
    use crate::server::Webhook;
    use crate::stats::{GROUP_ATTR, HANDLER_DURATION, STATUS_ATTR, VERSION_ATTR, WEBHOOK_TYPE_ATTR};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use kduck_metrics::default_meter;
    use serde_json::json;
    use tower::ServiceExt;

    struct FixedConversionController {
        path: String,
        response: ConversionResponse,
    }

    #[async_trait]
    impl ConversionController for FixedConversionController {
        fn path(&self) -> &str {
            &self.path
        }

        async fn convert(&self, _request: &ConversionRequest) -> ConversionResponse {
            self.response.clone()
        }
    }

    async fn call(response: ConversionResponse, body: Body) -> Response {
        let controller: Arc<dyn ConversionController> = Arc::new(FixedConversionController {
            path: "/bazinga".to_string(),
            response,
        });
        let webhook =
            Webhook::new(WebhookOptions::new("webhook", "webhook-certs"), vec![controller]).unwrap();
        let request = Request::builder()
            .method("POST")
            .uri("/bazinga")
            .header("content-type", "application/json")
            .body(body)
            .unwrap();
        webhook.router().oneshot(request).await.unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn review() -> Body {
        Body::from(
            json!({
                "apiVersion": REVIEW_API_VERSION,
                "kind": REVIEW_KIND,
                "request": {
                    "uid": "some-uid",
                    "desiredAPIVersion": "example.com/v1",
                    "objects": []
                }
            })
            .to_string(),
        )
    }

    fn recorded(status: &str) -> bool {
        default_meter()
            .retrieve_data(HANDLER_DURATION)
            .unwrap()
            .iter()
            .any(|row| {
                row.tags.get(WEBHOOK_TYPE_ATTR) == Some("conversion")
                    && row.tags.get(GROUP_ATTR) == Some("example.com")
                    && row.tags.get(VERSION_ATTR) == Some("v1")
                    && row.tags.get(STATUS_ATTR) == Some(status)
            })
    }

    #[tokio::test]
    async fn test_empty_request_body() {
        let response = call(ConversionResponse::default(), Body::empty()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.starts_with("could not decode body:"));
    }

    #[tokio::test]
    async fn test_review_without_request() {
        let body = Body::from(r#"{"apiVersion":"apiextensions.k8s.io/v1","kind":"ConversionReview"}"#);
        let response = call(ConversionResponse::default(), body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "conversion review has no request");
    }

    #[tokio::test]
    async fn test_valid_response() {
        let response = call(ConversionResponse::success("some-uid", vec![]), review()).await;
        assert_eq!(response.status(), StatusCode::OK);

        insta::assert_snapshot!(
            body_text(response).await,
            @r#"{"apiVersion":"apiextensions.k8s.io/v1","kind":"ConversionReview","response":{"uid":"some-uid","convertedObjects":[],"result":{"status":"Success"}}}"#
        );
        assert!(recorded("success"));
    }

    #[tokio::test]
    async fn test_reply_echoes_review_type_meta() {
        let body = Body::from(
            json!({
                "apiVersion": "apiextensions.k8s.io/v1beta1",
                "kind": "ConversionReview",
                "request": {
                    "uid": "some-uid",
                    "desiredAPIVersion": "example.com/v1",
                    "objects": []
                }
            })
            .to_string(),
        );
        let response = call(ConversionResponse::success("some-uid", vec![]), body).await;
        assert_eq!(response.status(), StatusCode::OK);

        let reply: ConversionReview = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(reply.api_version, "apiextensions.k8s.io/v1beta1");
        assert_eq!(reply.kind, "ConversionReview");
    }

    #[tokio::test]
    async fn test_invalid_response() {
        let response = call(ConversionResponse::failure("some-uid", "bad object"), review()).await;
        assert_eq!(response.status(), StatusCode::OK);

        let reply: ConversionReview = serde_json::from_str(&body_text(response).await).unwrap();
        let result = reply.response.unwrap();
        assert_eq!(result.uid, "some-uid");
        assert_eq!(result.result.summary(), "failure");
        assert!(recorded("failure"));
    }
}
