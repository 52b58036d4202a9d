//! Handlers for webhook registrations.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use contentflow_core::error::CoreError;
use contentflow_core::types::DbId;
use contentflow_core::webhook::normalize_event_filter;
use contentflow_db::models::webhook::{CreateWebhook, UpdateWebhook};
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

const ENTITY_WEBHOOK: &str = "webhook";

/// Request body for `POST /webhooks`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateWebhookRequest {
    #[validate(url)]
    pub url: String,
    /// Comma-separated event names; empty or `*` for all events.
    #[serde(default)]
    pub events: String,
    pub is_enabled: Option<bool>,
}

/// Request body for `PUT /webhooks/{id}`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateWebhookRequest {
    #[validate(url)]
    pub url: Option<String>,
    pub events: Option<String>,
    pub is_enabled: Option<bool>,
}

fn validate(input: &impl Validate) -> Result<(), AppError> {
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: ENTITY_WEBHOOK,
        id,
    })
}

/// POST /api/v1/webhooks
pub async fn create_webhook(
    State(state): State<AppState>,
    Json(input): Json<CreateWebhookRequest>,
) -> AppResult<impl IntoResponse> {
    validate(&input)?;
    let webhook = state
        .webhooks
        .create_webhook(&CreateWebhook {
            url: input.url,
            events: normalize_event_filter(&input.events),
            is_enabled: input.is_enabled,
        })
        .await?;

    tracing::info!(webhook_id = webhook.id, url = %webhook.url, "Webhook registered");
    Ok((StatusCode::CREATED, Json(DataResponse { data: webhook })))
}

/// GET /api/v1/webhooks
pub async fn list_webhooks(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let webhooks = state.webhooks.list_webhooks().await?;
    Ok(Json(DataResponse { data: webhooks }))
}

/// GET /api/v1/webhooks/{id}
pub async fn get_webhook(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let webhook = state
        .webhooks
        .find_webhook(id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: webhook }))
}

/// PUT /api/v1/webhooks/{id}
pub async fn update_webhook(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateWebhookRequest>,
) -> AppResult<impl IntoResponse> {
    validate(&input)?;
    let changes = UpdateWebhook {
        url: input.url,
        events: input.events.as_deref().map(normalize_event_filter),
        is_enabled: input.is_enabled,
    };
    let webhook = state
        .webhooks
        .update_webhook(id, &changes)
        .await?
        .ok_or_else(|| not_found(id))?;

    tracing::info!(webhook_id = id, "Webhook updated");
    Ok(Json(DataResponse { data: webhook }))
}

/// DELETE /api/v1/webhooks/{id}
pub async fn delete_webhook(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !state.webhooks.delete_webhook(id).await? {
        return Err(not_found(id));
    }

    tracing::info!(webhook_id = id, "Webhook deleted");
    Ok(StatusCode::NO_CONTENT)
}
