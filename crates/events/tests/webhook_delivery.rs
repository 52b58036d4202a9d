//! Delivery against a real local HTTP endpoint.

use std::time::Duration;

use assert_matches::assert_matches;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use contentflow_events::delivery::webhook::{DEFAULT_TIMEOUT, WEBHOOK_USER_AGENT};
use contentflow_events::{PlatformEvent, WebhookDelivery, WebhookError, WebhookSender};
use tokio::sync::mpsc;

type Captured = (HeaderMap, serde_json::Value);

async fn capture(
    State(tx): State<mpsc::UnboundedSender<Captured>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> StatusCode {
    let _ = tx.send((headers, body));
    StatusCode::NO_CONTENT
}

/// Serve a capture endpoint at `/hook` and a failing one at `/broken`.
async fn spawn_endpoint() -> (String, mpsc::UnboundedReceiver<Captured>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let app = Router::new()
        .route("/hook", post(capture))
        .route("/broken", post(|| async { StatusCode::BAD_GATEWAY }))
        .with_state(tx);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), rx)
}

#[tokio::test]
async fn posts_json_body_with_user_agent() {
    let (base, mut rx) = spawn_endpoint().await;
    let delivery = WebhookDelivery::new(DEFAULT_TIMEOUT).unwrap();
    let event = PlatformEvent::new("content.create")
        .about("content", 3)
        .with_payload(serde_json::json!({"id": 3, "title": "Hello"}));

    delivery
        .send(&format!("{base}/hook"), &event)
        .await
        .unwrap();

    let (headers, body) = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(headers["user-agent"], WEBHOOK_USER_AGENT);
    assert_eq!(headers["content-type"], "application/json");
    assert_eq!(body["event"], "content.create");
    assert_eq!(body["timestamp"], event.timestamp.timestamp());
    assert_eq!(body["data"]["title"], "Hello");
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let (base, _rx) = spawn_endpoint().await;
    let delivery = WebhookDelivery::new(DEFAULT_TIMEOUT).unwrap();

    let err = delivery
        .send(&format!("{base}/broken"), &PlatformEvent::new("content.delete"))
        .await
        .unwrap_err();
    assert_matches!(err, WebhookError::HttpStatus(502));
}

#[tokio::test]
async fn unreachable_endpoint_is_a_request_error() {
    let delivery = WebhookDelivery::new(Duration::from_secs(2)).unwrap();
    let err = delivery
        .send("http://127.0.0.1:1/hook", &PlatformEvent::new("content.delete"))
        .await
        .unwrap_err();
    assert_matches!(err, WebhookError::Request(_));
}
