//! # HTTP Server
//!
//! Combines the streaming and observability routers into one axum server.

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::config::HttpServerConfig;
use super::observability_routes::{health_routes, observability_routes};
use super::realtime_routes::realtime_routes;
use crate::realtime::RealtimeService;

/// HTTP server for the event streams
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig, service: Arc<RealtimeService>) -> Self {
        let router = Self::build_router(&config, service);
        Self { config, router }
    }

    fn build_router(config: &HttpServerConfig, service: Arc<RealtimeService>) -> Router {
        Router::new()
            .merge(health_routes())
            .nest("/api/sse", realtime_routes(Arc::clone(&service)))
            .nest("/observability", observability_routes(service))
            .layer(TraceLayer::new_for_http())
            .layer(config.cors_layer())
    }

    pub fn address(&self) -> String {
        self.config.address()
    }

    /// Consume the server, returning its router
    pub fn router(self) -> Router {
        self.router
    }

    /// Bind and serve until the listener fails
    pub async fn start(self) -> std::io::Result<()> {
        let addr = self
            .config
            .socket_addr()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "issuestream listening");

        axum::serve(listener, self.router).await
    }
}
