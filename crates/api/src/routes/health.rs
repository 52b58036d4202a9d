//! Liveness and store reachability, mounted at the root (`/health`).

use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    /// `ok` when the store answers, `degraded` otherwise.
    pub status: &'static str,
    pub version: &'static str,
    pub store_reachable: bool,
}

/// GET /health. Answers 503 while the store is unreachable so load
/// balancers take the instance out of rotation.
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let store_reachable = match state.store.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check: store unreachable");
            false
        }
    };

    let (code, status) = if store_reachable {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        code,
        Json(HealthReport {
            status,
            version: env!("CARGO_PKG_VERSION"),
            store_reachable,
        }),
    )
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
