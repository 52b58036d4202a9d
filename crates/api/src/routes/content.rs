//! Route definitions for content, mounted at `/content`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::content;
use crate::state::AppState;

/// ```text
/// GET    /                        -> list_content
/// POST   /                        -> create_content
/// GET    /{id}                    -> get_content
/// PUT    /{id}                    -> update_content
/// DELETE /{id}                    -> delete_content
/// POST   /{id}/localize           -> add_translation
/// GET    /{id}/history            -> get_history
/// POST   /{id}/revert/{version}   -> revert_content
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(content::list_content).post(content::create_content),
        )
        .route(
            "/{id}",
            get(content::get_content)
                .put(content::update_content)
                .delete(content::delete_content),
        )
        .route("/{id}/localize", post(content::add_translation))
        .route("/{id}/history", get(content::get_history))
        .route("/{id}/revert/{version}", post(content::revert_content))
}
