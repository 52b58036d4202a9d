#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use contentflow_api::config::ServerConfig;
use contentflow_api::router::build_app_router;
use contentflow_api::state::AppState;
use contentflow_db::store::MemoryStore;
use contentflow_events::EventBus;
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        database_url: String::new(),
        database_max_connections: 1,
        database_acquire_timeout_secs: 1,
        scheduler_interval_secs: 60,
        webhook_timeout_secs: 10,
        webhook_max_concurrency: 4,
    }
}

/// A router over an in-memory store, plus handles for inspecting side effects.
pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
    pub event_bus: Arc<EventBus>,
}

/// Build the full application router with the production middleware stack.
pub fn build_test_app() -> TestApp {
    let store = MemoryStore::new();
    let event_bus = Arc::new(EventBus::default());
    let config = test_config();
    let state = AppState::new(Arc::new(store.clone()), config.clone(), event_bus.clone());
    TestApp {
        router: build_app_router(state, &config),
        store,
        event_bus,
    }
}

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<serde_json::Value>) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None).await
}

pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn put_json(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn delete(app: &Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
