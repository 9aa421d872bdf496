//! Realtime HTTP Routes
//!
//! Server-Sent Events endpoints for issue and user event streams, plus
//! connection stats and explicit close.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{
        sse::{Event as SseEvent, KeepAlive, Sse},
        IntoResponse,
    },
    routing::{delete, get},
    Json, Router,
};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::auth::principal_from;
use crate::realtime::{
    OutboundMessage, Principal, RealtimeError, RealtimeService, StatsQuery, SubscribeTarget,
    SubscriptionId,
};

/// Response header carrying the new subscription's id
pub const SUBSCRIPTION_ID_HEADER: &str = "x-subscription-id";

// ==================
// Request/Response Types
// ==================

/// Query parameters shared by the SSE endpoints
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamParams {
    #[serde(default)]
    pub project_id: Option<Uuid>,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl From<RealtimeError> for ErrorResponse {
    fn from(err: RealtimeError) -> Self {
        Self {
            code: err.status_code(),
            error: err.to_string(),
        }
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(err: RealtimeError) -> ApiError {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorResponse::from(err)))
}

// ==================
// Router
// ==================

/// Create realtime routes
pub fn realtime_routes(service: Arc<RealtimeService>) -> Router {
    Router::new()
        .route("/issues", get(issues_stream_handler))
        .route("/user", get(user_stream_handler))
        .route("/stats", get(stats_handler))
        .route("/subscriptions/:id", delete(close_handler))
        .with_state(service)
}

// ==================
// Handlers
// ==================

/// Issue events, for one project when `projectId` is given
async fn issues_stream_handler(
    State(service): State<Arc<RealtimeService>>,
    headers: HeaderMap,
    Query(params): Query<StreamParams>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = principal_from(&headers, params.token.as_deref()).map_err(api_error)?;
    open_stream(&service, principal, SubscribeTarget::Issues(params.project_id)).await
}

/// Events addressed to the caller
async fn user_stream_handler(
    State(service): State<Arc<RealtimeService>>,
    headers: HeaderMap,
    Query(params): Query<StreamParams>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = principal_from(&headers, params.token.as_deref()).map_err(api_error)?;
    open_stream(&service, principal, SubscribeTarget::UserEvents).await
}

async fn open_stream(
    service: &RealtimeService,
    principal: Principal,
    target: SubscribeTarget,
) -> Result<impl IntoResponse, ApiError> {
    let stream = service
        .subscribe(&principal, target)
        .await
        .map_err(api_error)?;

    let id = stream.handle().id().to_string();
    let keep_alive = KeepAlive::new().interval(service.config().keep_alive());
    let sse = Sse::new(stream.map(|msg| to_sse_event(&msg))).keep_alive(keep_alive);

    Ok(([(SUBSCRIPTION_ID_HEADER, id)], sse))
}

/// Connection counts: per project, per user, or total
async fn stats_handler(
    State(service): State<Arc<RealtimeService>>,
    headers: HeaderMap,
    Query(params): Query<StreamParams>,
) -> Result<impl IntoResponse, ApiError> {
    principal_from(&headers, params.token.as_deref()).map_err(api_error)?;

    let query = match (params.project_id, params.user_id) {
        (Some(project), _) => StatsQuery::Project(project),
        (None, Some(user)) => StatsQuery::User(user),
        (None, None) => StatsQuery::Total,
    };

    Ok(Json(service.stats(query)))
}

/// Close one of the caller's own subscriptions
async fn close_handler(
    State(service): State<Arc<RealtimeService>>,
    headers: HeaderMap,
    Query(params): Query<StreamParams>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = principal_from(&headers, params.token.as_deref()).map_err(api_error)?;
    let id = SubscriptionId::parse(&id)
        .ok_or_else(|| api_error(RealtimeError::SubscriptionNotFound(id.clone())))?;

    service.close(&principal, id).map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Frame an outbound message as an SSE event.
///
/// The connection acknowledgement is sent as plain text; event payloads
/// are sent as JSON.
pub fn to_sse_event(msg: &OutboundMessage) -> Result<SseEvent, axum::Error> {
    if msg.event.contains(['\n', '\r']) {
        return Err(axum::Error::new(format!("invalid event name {:?}", msg.event)));
    }

    let event = SseEvent::default().event(&msg.event);
    match (&msg.data, msg.is_connected_ack()) {
        (Value::String(text), true) => Ok(event.data(text)),
        (data, _) => event.json_data(data),
    }
}
