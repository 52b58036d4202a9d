//! Repository for the `contents` table.

use contentflow_core::content::ContentStatus;
use contentflow_core::types::{DbId, Timestamp};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::models::content::{Content, ContentFilter, ContentPage, NewContent};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, title, slug, body, content_type, attributes, status, language, \
    group_id, version, author_id, published_at, blocks, created_at, updated_at, deleted_at";

/// Provides CRUD and scheduling queries for content records.
pub struct ContentRepo;

impl ContentRepo {
    /// Insert a new content record at version 1.
    pub async fn insert<'e, E: PgExecutor<'e>>(
        executor: E,
        input: &NewContent,
    ) -> Result<Content, sqlx::Error> {
        let query = format!(
            "INSERT INTO contents
                (title, slug, body, content_type, attributes, status, language,
                 group_id, version, author_id, published_at, blocks)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 1, $9, $10, $11)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Content>(&query)
            .bind(&input.title)
            .bind(&input.slug)
            .bind(&input.body)
            .bind(&input.content_type)
            .bind(&input.attributes)
            .bind(&input.status)
            .bind(&input.language)
            .bind(input.group_id)
            .bind(input.author_id)
            .bind(input.published_at)
            .bind(&input.blocks)
            .fetch_one(executor)
            .await
    }

    /// Find a live content record by ID. Excludes soft-deleted rows.
    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<Option<Content>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM contents WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Content>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find a live content record and lock its row until the surrounding
    /// transaction ends. Concurrent mutators of the same record queue here.
    pub async fn find_for_update<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<Option<Content>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM contents WHERE id = $1 AND deleted_at IS NULL FOR UPDATE"
        );
        sqlx::query_as::<_, Content>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Write every mutable field of `content` back to its row.
    pub async fn save<'e, E: PgExecutor<'e>>(
        executor: E,
        content: &Content,
    ) -> Result<Content, sqlx::Error> {
        let query = format!(
            "UPDATE contents SET
                title = $2,
                body = $3,
                content_type = $4,
                attributes = $5,
                status = $6,
                language = $7,
                version = $8,
                published_at = $9,
                blocks = $10,
                updated_at = NOW()
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Content>(&query)
            .bind(content.id)
            .bind(&content.title)
            .bind(&content.body)
            .bind(&content.content_type)
            .bind(&content.attributes)
            .bind(&content.status)
            .bind(&content.language)
            .bind(content.version)
            .bind(content.published_at)
            .bind(&content.blocks)
            .fetch_one(executor)
            .await
    }

    /// Whether a live record in `group_id` already uses `language`.
    pub async fn language_exists_in_group<'e, E: PgExecutor<'e>>(
        executor: E,
        group_id: Uuid,
        language: &str,
    ) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS(
                SELECT 1 FROM contents
                WHERE group_id = $1 AND language = $2 AND deleted_at IS NULL
             )",
        )
        .bind(group_id)
        .bind(language)
        .fetch_one(executor)
        .await?;
        Ok(row.0)
    }

    /// List live content matching `filter`, newest first, with the total
    /// count before pagination.
    pub async fn list(pool: &PgPool, filter: &ContentFilter) -> Result<ContentPage, sqlx::Error> {
        // Build dynamic WHERE clauses.
        let mut conditions = vec!["c.deleted_at IS NULL".to_string()];
        let mut bind_idx = 1u32;

        if filter.search.is_some() {
            conditions.push(format!(
                "(c.title ILIKE ${bind_idx} OR c.body ILIKE ${bind_idx})"
            ));
            bind_idx += 1;
        }
        if filter.content_type.is_some() {
            conditions.push(format!("c.content_type = ${bind_idx}"));
            bind_idx += 1;
        }
        if filter.status.is_some() {
            conditions.push(format!("c.status = ${bind_idx}"));
            bind_idx += 1;
        }
        if filter.language.is_some() {
            conditions.push(format!("c.language = ${bind_idx}"));
            bind_idx += 1;
        }
        if !filter.tags.is_empty() {
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM content_tags ct JOIN tags t ON t.id = ct.tag_id \
                 WHERE ct.content_id = c.id AND t.name = ANY(${bind_idx}))"
            ));
            bind_idx += 1;
        }

        let where_clause = format!("WHERE {}", conditions.join(" AND "));
        let columns = COLUMNS
            .split(", ")
            .map(|col| format!("c.{}", col.trim()))
            .collect::<Vec<_>>()
            .join(", ");

        let count_query = format!("SELECT COUNT(*) FROM contents c {where_clause}");
        let list_query = format!(
            "SELECT {columns} FROM contents c {where_clause} \
             ORDER BY c.created_at DESC, c.id DESC \
             LIMIT ${bind_idx} OFFSET ${next_idx}",
            next_idx = bind_idx + 1,
        );

        let mut count_q = sqlx::query_as::<_, (i64,)>(&count_query);
        let mut list_q = sqlx::query_as::<_, Content>(&list_query);

        // Bind dynamic parameters in order.
        if let Some(ref search) = filter.search {
            let pattern = format!("%{search}%");
            count_q = count_q.bind(pattern.clone());
            list_q = list_q.bind(pattern);
        }
        if let Some(ref content_type) = filter.content_type {
            count_q = count_q.bind(content_type.clone());
            list_q = list_q.bind(content_type.clone());
        }
        if let Some(ref status) = filter.status {
            count_q = count_q.bind(status.clone());
            list_q = list_q.bind(status.clone());
        }
        if let Some(ref language) = filter.language {
            count_q = count_q.bind(language.clone());
            list_q = list_q.bind(language.clone());
        }
        if !filter.tags.is_empty() {
            count_q = count_q.bind(filter.tags.clone());
            list_q = list_q.bind(filter.tags.clone());
        }

        let (total,) = count_q.fetch_one(pool).await?;
        let items = list_q
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(pool)
            .await?;

        Ok(ContentPage { items, total })
    }

    /// List scheduled content whose publish time is at or before `now`.
    pub async fn list_due_scheduled(
        pool: &PgPool,
        now: Timestamp,
    ) -> Result<Vec<Content>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM contents
             WHERE status = $1 AND published_at <= $2 AND deleted_at IS NULL
             ORDER BY published_at ASC, id ASC"
        );
        sqlx::query_as::<_, Content>(&query)
            .bind(ContentStatus::Scheduled.as_str())
            .bind(now)
            .fetch_all(pool)
            .await
    }

    /// Flip a scheduled record to published in a single statement.
    ///
    /// Returns `None` when the record is no longer scheduled or no longer
    /// due at `now` (another sweep published it, or an editor moved
    /// `published_at`), so callers notify at most once.
    pub async fn publish_scheduled(
        pool: &PgPool,
        id: DbId,
        now: Timestamp,
    ) -> Result<Option<Content>, sqlx::Error> {
        let query = format!(
            "UPDATE contents SET status = $2, updated_at = NOW()
             WHERE id = $1 AND status = $3 AND published_at <= $4 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Content>(&query)
            .bind(id)
            .bind(ContentStatus::Published.as_str())
            .bind(ContentStatus::Scheduled.as_str())
            .bind(now)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a record. Returns the record as it was marked deleted.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<Option<Content>, sqlx::Error> {
        let query = format!(
            "UPDATE contents SET deleted_at = NOW(), updated_at = NOW()
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Content>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
