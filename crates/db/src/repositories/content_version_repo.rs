//! Repository for the `content_versions` table.
//!
//! Versions are append-only: there is no update or delete.

use contentflow_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::content_version::{ContentVersion, NewContentVersion};

/// Column list for content_versions queries.
const COLUMNS: &str = "id, content_id, version, title, body, content_type, attributes, \
    status, language, blocks, change_kind, reverted_to, changed_at";

/// Provides append and read operations for content snapshots.
pub struct ContentVersionRepo;

impl ContentVersionRepo {
    /// Append a snapshot.
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        input: &NewContentVersion,
    ) -> Result<ContentVersion, sqlx::Error> {
        let query = format!(
            "INSERT INTO content_versions
                (content_id, version, title, body, content_type, attributes, status,
                 language, blocks, change_kind, reverted_to)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ContentVersion>(&query)
            .bind(input.content_id)
            .bind(input.version)
            .bind(&input.title)
            .bind(&input.body)
            .bind(&input.content_type)
            .bind(&input.attributes)
            .bind(&input.status)
            .bind(&input.language)
            .bind(&input.blocks)
            .bind(input.change_kind)
            .bind(input.reverted_to)
            .fetch_one(executor)
            .await
    }

    /// List all snapshots for a content record, newest version first.
    pub async fn list_by_content(
        pool: &PgPool,
        content_id: DbId,
    ) -> Result<Vec<ContentVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM content_versions
             WHERE content_id = $1
             ORDER BY version DESC"
        );
        sqlx::query_as::<_, ContentVersion>(&query)
            .bind(content_id)
            .fetch_all(pool)
            .await
    }

    /// Find the snapshot representing `version` of a content record.
    pub async fn find_by_content_and_version<'e, E: PgExecutor<'e>>(
        executor: E,
        content_id: DbId,
        version: i32,
    ) -> Result<Option<ContentVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM content_versions
             WHERE content_id = $1 AND version = $2"
        );
        sqlx::query_as::<_, ContentVersion>(&query)
            .bind(content_id)
            .bind(version)
            .fetch_optional(executor)
            .await
    }
}
