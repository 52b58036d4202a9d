pub mod content;
pub mod health;
pub mod webhook;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /content                                 list, create
/// /content/{id}                            get, update, delete
/// /content/{id}/localize                   add translation (POST)
/// /content/{id}/history                    version history (GET)
/// /content/{id}/revert/{version}           revert (POST)
///
/// /webhooks                                list, register
/// /webhooks/{id}                           get, update, delete
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/content", content::router())
        .nest("/webhooks", webhook::router())
}
