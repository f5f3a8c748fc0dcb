//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Wrap the application router in middleware (timeout, request ID, tracing)
//! - Bind server to listener
//! - Stop accepting and drain on shutdown

use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};

/// HTTP server for an applied routing tree.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
}

impl HttpServer {
    /// Create a new HTTP server serving `app`.
    pub fn new(config: AppConfig, app: Router) -> Self {
        let router = Self::build_router(&config, app);
        Self { router, config }
    }

    /// Wrap the application with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, app: Router) -> Router {
        app.layer(TimeoutLayer::new(Duration::from_secs(
            config.timeouts.request_secs,
        )))
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(set_request_id_layer())
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The fully layered router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}
