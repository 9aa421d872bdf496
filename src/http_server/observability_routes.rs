//! Health and counters endpoints

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::observability::MetricsSnapshot;
use crate::realtime::RealtimeService;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// Counters plus the live connection count
#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    #[serde(flatten)]
    pub counters: MetricsSnapshot,
    pub active_connections: usize,
}

/// `/health` and `/metrics`, nested under `/observability`
pub fn observability_routes(service: Arc<RealtimeService>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(service)
}

/// `/health` at the root
pub fn health_routes() -> Router {
    Router::new().route("/health", get(health))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

async fn metrics(State(service): State<Arc<RealtimeService>>) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        counters: service.metrics().snapshot(),
        active_connections: service.registry().count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::MetricsRegistry;

    #[test]
    fn test_health_is_ok() {
        let json = serde_json::to_value(HealthResponse::ok()).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_metrics_response_flattens_counters() {
        let registry = MetricsRegistry::new();
        registry.increment_events_published();

        let json = serde_json::to_value(MetricsResponse {
            counters: registry.snapshot(),
            active_connections: 3,
        })
        .unwrap();
        assert_eq!(json["events_published"], 1);
        assert_eq!(json["active_connections"], 3);
    }
}
