//! Webhook registration model and DTOs.

use contentflow_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `webhooks` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Webhook {
    pub id: DbId,
    pub url: String,
    /// Comma-separated event names; empty or `*` subscribes to everything.
    pub events: String,
    pub is_enabled: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for registering a webhook.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateWebhook {
    pub url: String,
    #[serde(default)]
    pub events: String,
    pub is_enabled: Option<bool>,
}

/// DTO for updating a webhook. All fields optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateWebhook {
    pub url: Option<String>,
    pub events: Option<String>,
    pub is_enabled: Option<bool>,
}
