//! Handlers for content records, their translations and version history.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use contentflow_core::types::DbId;
use contentflow_db::models::content::{ContentChanges, CreateContent};

use crate::error::AppResult;
use crate::query::ContentListParams;
use crate::response::{DataResponse, PageMeta, PageResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// POST /api/v1/content
pub async fn create_content(
    State(state): State<AppState>,
    Json(input): Json<CreateContent>,
) -> AppResult<impl IntoResponse> {
    let content = state.content.create(input, None).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: content })))
}

/// GET /api/v1/content
///
/// Supports `q`, `type`, `status`, `lang`, `tags`, `limit` and `offset`.
pub async fn list_content(
    State(state): State<AppState>,
    Query(params): Query<ContentListParams>,
) -> AppResult<impl IntoResponse> {
    let filter = params.into_filter()?;
    let (limit, offset) = (filter.limit, filter.offset);
    let page = state.content.list(filter).await?;

    Ok(Json(PageResponse {
        data: page.items,
        meta: PageMeta {
            total: page.total,
            limit,
            offset,
        },
    }))
}

/// GET /api/v1/content/{id}
///
/// Returns the record with its categories and tags.
pub async fn get_content(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let detail = state.content.get(id).await?;
    Ok(Json(DataResponse { data: detail }))
}

/// PUT /api/v1/content/{id}
///
/// Partial update recorded as a new version.
pub async fn update_content(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(changes): Json<ContentChanges>,
) -> AppResult<impl IntoResponse> {
    let content = state.content.update(id, changes).await?;
    Ok(Json(DataResponse { data: content }))
}

/// DELETE /api/v1/content/{id}
pub async fn delete_content(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    state.content.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Translations and history
// ---------------------------------------------------------------------------

/// POST /api/v1/content/{id}/localize
pub async fn add_translation(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CreateContent>,
) -> AppResult<impl IntoResponse> {
    let translation = state.content.add_translation(id, input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: translation })))
}

/// GET /api/v1/content/{id}/history
///
/// Snapshots ordered by version, newest first.
pub async fn get_history(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let history = state.content.history(id).await?;
    Ok(Json(DataResponse { data: history }))
}

/// POST /api/v1/content/{id}/revert/{version}
pub async fn revert_content(
    State(state): State<AppState>,
    Path((id, version)): Path<(DbId, i32)>,
) -> AppResult<impl IntoResponse> {
    let content = state.content.revert(id, version).await?;
    Ok(Json(DataResponse { data: content }))
}
