//! HTTP server hosting conversion controllers

use std::collections::HashSet;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::Router;
use axum::routing::any;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::conversion::{ConversionController, handle_conversion};
use crate::error::{Result, WebhookError};
use crate::options::WebhookOptions;
use crate::stats;

/// A webhook serving one path per controller
pub struct Webhook {
    pub options: WebhookOptions,
    controllers: Vec<Arc<dyn ConversionController>>,
}

impl Webhook {
    /// Create the webhook and register its metric views.
    ///
    /// Fails when a controller path does not start with `/` or two
    /// controllers share a path.
    pub fn new(
        options: WebhookOptions,
        controllers: Vec<Arc<dyn ConversionController>>,
    ) -> Result<Self> {
        let mut paths = HashSet::new();
        for controller in &controllers {
            let path = controller.path();
            if !path.starts_with('/') {
                return Err(WebhookError::InvalidOptions(format!(
                    "controller path {:?} must start with '/'",
                    path
                )));
            }
            if !paths.insert(path.to_string()) {
                return Err(WebhookError::InvalidOptions(format!(
                    "duplicate controller path {:?}",
                    path
                )));
            }
        }

        stats::register_views()?;
        Ok(Self {
            options,
            controllers,
        })
    }

    /// Router with every controller mounted at its path
    pub fn router(&self) -> Router {
        self.controllers
            .iter()
            .fold(Router::new(), |router, controller| {
                router.merge(
                    Router::new()
                        .route(controller.path(), any(handle_conversion))
                        .with_state(Arc::clone(controller)),
                )
            })
    }

    /// Listen on all interfaces at the configured port until `shutdown` fires
    pub async fn run(&self, shutdown: CancellationToken) -> Result<()> {
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.options.port));
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` fires
    pub async fn serve(&self, listener: TcpListener, shutdown: CancellationToken) -> Result<()> {
        info!(
            addr = %listener.local_addr()?,
            service = %self.options.service_name,
            controllers = self.controllers.len(),
            "webhook listening"
        );
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;
        info!("webhook stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::{ConversionRequest, ConversionResponse};
    use async_trait::async_trait;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    struct Echo(&'static str);

    #[async_trait]
    impl ConversionController for Echo {
        fn path(&self) -> &str {
            self.0
        }

        async fn convert(&self, request: &ConversionRequest) -> ConversionResponse {
            ConversionResponse::success(&request.uid, request.objects.clone())
        }
    }

    fn echo(path: &'static str) -> Arc<dyn ConversionController> {
        Arc::new(Echo(path))
    }

    fn options() -> WebhookOptions {
        WebhookOptions::new("webhook", "webhook-certs")
    }

    #[test]
    fn test_rejects_bad_paths() {
        let err = Webhook::new(options(), vec![echo("convert")]).err().unwrap();
        assert!(matches!(err, WebhookError::InvalidOptions(_)));

        let err = Webhook::new(options(), vec![echo("/convert"), echo("/convert")])
            .err()
            .unwrap();
        assert!(err.to_string().contains("duplicate"));
    }

    #[tokio::test]
    async fn test_serve_until_cancelled() {
        let webhook = Webhook::new(options(), vec![echo("/convert")]).unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = CancellationToken::new();
        let server = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move { webhook.serve(listener, shutdown).await })
        };

        let body = r#"{"apiVersion":"apiextensions.k8s.io/v1","kind":"ConversionReview","request":{"uid":"abc","desiredAPIVersion":"example.com/v1","objects":[]}}"#;
        let request = format!(
            "POST /convert HTTP/1.1\r\nHost: {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            addr,
            body.len(),
            body
        );
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut reply = String::new();
        stream.read_to_string(&mut reply).await.unwrap();

        assert!(reply.starts_with("HTTP/1.1 200"));
        assert!(reply.contains(r#""uid":"abc""#));

        shutdown.cancel();
        server.await.unwrap().unwrap();
    }
}
