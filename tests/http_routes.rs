//! HTTP Route Tests
//!
//! Drives the axum router in-process with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use futures_util::StreamExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use issuestream::http_server::realtime_routes::SUBSCRIPTION_ID_HEADER;
use issuestream::http_server::{HttpServer, HttpServerConfig};
use issuestream::realtime::{kinds, MembershipGate, RealtimeConfig, RealtimeService};

struct App {
    service: Arc<RealtimeService>,
    gate: Arc<MembershipGate>,
}

impl App {
    fn new() -> Self {
        let gate = Arc::new(MembershipGate::new());
        let service = Arc::new(RealtimeService::new(RealtimeConfig::default(), gate.clone()));
        Self { service, gate }
    }

    fn router(&self) -> Router {
        HttpServer::new(HttpServerConfig::default(), Arc::clone(&self.service)).router()
    }

    async fn get(&self, uri: &str) -> axum::response::Response {
        self.router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Read the next SSE frame from a streaming body
async fn next_frame(body: &mut axum::body::BodyDataStream) -> String {
    let chunk = body.next().await.unwrap().unwrap();
    String::from_utf8(chunk.to_vec()).unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = App::new();
    let response = app.get("/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}

#[tokio::test]
async fn test_issue_stream_requires_token() {
    let app = App::new();
    let response = app.get("/api/sse/issues").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["code"], 401);
}

#[tokio::test]
async fn test_issue_stream_unknown_project() {
    let app = App::new();
    let uri = format!(
        "/api/sse/issues?projectId={}&token={}",
        Uuid::new_v4(),
        Uuid::new_v4()
    );
    let response = app.get(&uri).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("Project not found"));
    assert_eq!(app.service.registry().count(), 0);
}

#[tokio::test]
async fn test_issue_stream_forbidden_for_non_member() {
    let app = App::new();
    let project = Uuid::new_v4();
    app.gate.add_project(project, Uuid::new_v4());

    let uri = format!("/api/sse/issues?projectId={}&token={}", project, Uuid::new_v4());
    let response = app.get(&uri).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.service.registry().count(), 0);
}

#[tokio::test]
async fn test_project_stream_delivers_events() {
    let app = App::new();
    let project = Uuid::new_v4();
    let owner = Uuid::new_v4();
    app.gate.add_project(project, owner);

    let uri = format!("/api/sse/issues?projectId={}&token={}", project, owner);
    let response = app.get(&uri).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );
    assert!(response.headers().contains_key(SUBSCRIPTION_ID_HEADER));

    let mut body = response.into_body().into_data_stream();
    let ack = next_frame(&mut body).await;
    assert!(ack.contains("event: connected"));
    assert!(ack.contains(&format!("Connected to issue updates for project {}", project)));

    app.service
        .broadcaster()
        .publish_to_project(kinds::ISSUE_CREATED, project, json!({"id": 7}))
        .await;

    let frame = next_frame(&mut body).await;
    assert!(frame.contains("event: issue-created"));
    assert!(frame.contains(r#"{"id":7}"#));
}

#[tokio::test]
async fn test_user_stream_with_bearer_header() {
    let app = App::new();
    let user = Uuid::new_v4();

    let response = app
        .router()
        .oneshot(
            Request::builder()
                .uri("/api/sse/user")
                .header(header::AUTHORIZATION, format!("Bearer {}", user))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut body = response.into_body().into_data_stream();
    let ack = next_frame(&mut body).await;
    assert!(ack.contains(&format!("Connected to user events for user {}", user)));
    assert_eq!(app.service.registry().count_for_user(user), 1);
}

#[tokio::test]
async fn test_stats_track_open_streams() {
    let app = App::new();
    let user = Uuid::new_v4();

    let stats_uri = format!("/api/sse/stats?token={}", user);
    assert_eq!(
        json_body(app.get(&stats_uri).await).await["totalActiveConnections"],
        0
    );

    let stream = app.get(&format!("/api/sse/issues?token={}", user)).await;
    assert_eq!(
        json_body(app.get(&stats_uri).await).await["totalActiveConnections"],
        1
    );

    let user_stats = json_body(
        app.get(&format!("/api/sse/stats?userId={}&token={}", user, user))
            .await,
    )
    .await;
    assert_eq!(user_stats["activeConnections"], 0);

    // Client disconnect drops the body and ends the subscription
    drop(stream);
    assert_eq!(
        json_body(app.get(&stats_uri).await).await["totalActiveConnections"],
        0
    );
    assert_eq!(app.service.metrics().snapshot().terminated_transport_error, 1);
}

#[tokio::test]
async fn test_close_subscription() {
    let app = App::new();
    let user = Uuid::new_v4();

    let response = app.get(&format!("/api/sse/issues?token={}", user)).await;
    let id = response.headers()[SUBSCRIPTION_ID_HEADER]
        .to_str()
        .unwrap()
        .to_string();
    let mut body = response.into_body().into_data_stream();
    next_frame(&mut body).await;

    let close = |token: Uuid| {
        Request::builder()
            .method(Method::DELETE)
            .uri(format!("/api/sse/subscriptions/{}?token={}", id, token))
            .body(Body::empty())
            .unwrap()
    };

    let other = app.router().oneshot(close(Uuid::new_v4())).await.unwrap();
    assert_eq!(other.status(), StatusCode::NOT_FOUND);

    let own = app.router().oneshot(close(user)).await.unwrap();
    assert_eq!(own.status(), StatusCode::NO_CONTENT);
    assert_eq!(app.service.registry().count(), 0);

    // The stream ends once its subscription is closed
    assert!(body.next().await.is_none());
    assert_eq!(app.service.metrics().snapshot().terminated_closed, 1);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = App::new();
    let user = Uuid::new_v4();
    let _stream = app.get(&format!("/api/sse/user?token={}", user)).await;

    let metrics = json_body(app.get("/observability/metrics").await).await;
    assert_eq!(metrics["subscriptions_opened"], 1);
    assert_eq!(metrics["active_connections"], 1);
}
