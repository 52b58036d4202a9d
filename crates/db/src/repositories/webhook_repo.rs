//! Repository for the `webhooks` table.

use contentflow_core::types::DbId;
use sqlx::PgPool;

use crate::models::webhook::{CreateWebhook, UpdateWebhook, Webhook};

const COLUMNS: &str = "id, url, events, is_enabled, created_at, updated_at";

/// Provides CRUD operations for webhook registrations.
pub struct WebhookRepo;

impl WebhookRepo {
    /// Register a new webhook. Enabled unless `is_enabled` says otherwise.
    pub async fn create(pool: &PgPool, input: &CreateWebhook) -> Result<Webhook, sqlx::Error> {
        let query = format!(
            "INSERT INTO webhooks (url, events, is_enabled) \
             VALUES ($1, $2, COALESCE($3, true)) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Webhook>(&query)
            .bind(&input.url)
            .bind(&input.events)
            .bind(input.is_enabled)
            .fetch_one(pool)
            .await
    }

    /// List all webhooks ordered by creation date (newest first).
    pub async fn list(pool: &PgPool) -> Result<Vec<Webhook>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM webhooks ORDER BY created_at DESC, id DESC");
        sqlx::query_as::<_, Webhook>(&query).fetch_all(pool).await
    }

    /// List enabled webhooks, oldest first. Read by the dispatcher per event.
    pub async fn list_enabled(pool: &PgPool) -> Result<Vec<Webhook>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM webhooks WHERE is_enabled ORDER BY id");
        sqlx::query_as::<_, Webhook>(&query).fetch_all(pool).await
    }

    /// Find a webhook by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Webhook>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM webhooks WHERE id = $1");
        sqlx::query_as::<_, Webhook>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Update a webhook's settings. Only non-`None` fields are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateWebhook,
    ) -> Result<Option<Webhook>, sqlx::Error> {
        let query = format!(
            "UPDATE webhooks SET \
                 url = COALESCE($2, url), \
                 events = COALESCE($3, events), \
                 is_enabled = COALESCE($4, is_enabled), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Webhook>(&query)
            .bind(id)
            .bind(input.url.as_deref())
            .bind(input.events.as_deref())
            .bind(input.is_enabled)
            .fetch_optional(pool)
            .await
    }

    /// Delete a webhook by ID.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM webhooks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
