//! Repository for categories, tags and their content associations.

use contentflow_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::taxonomy::{Category, Tag};

const CATEGORY_COLUMNS: &str = "c.id, c.name, c.slug, c.created_at";
const TAG_COLUMNS: &str = "t.id, t.name, t.slug, t.created_at";

/// Association queries used by the content engine.
pub struct TaxonomyRepo;

impl TaxonomyRepo {
    /// Replace a record's categories with the existing categories among
    /// `category_ids`. Unknown ids are ignored.
    pub async fn replace_categories(
        conn: &mut PgConnection,
        content_id: DbId,
        category_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM content_categories WHERE content_id = $1")
            .bind(content_id)
            .execute(&mut *conn)
            .await?;

        sqlx::query(
            "INSERT INTO content_categories (content_id, category_id)
             SELECT $1, id FROM categories WHERE id = ANY($2)
             ON CONFLICT DO NOTHING",
        )
        .bind(content_id)
        .bind(category_ids)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Find a tag by name, creating it (with `slug = name`) when missing.
    pub async fn find_or_create_tag(conn: &mut PgConnection, name: &str) -> Result<DbId, sqlx::Error> {
        let row: (DbId,) = sqlx::query_as(
            "INSERT INTO tags (name, slug) VALUES ($1, $1)
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
             RETURNING id",
        )
        .bind(name)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row.0)
    }

    /// Replace a record's tags, creating any tag names not seen before.
    pub async fn replace_tags(
        conn: &mut PgConnection,
        content_id: DbId,
        names: &[String],
    ) -> Result<(), sqlx::Error> {
        let mut tag_ids = Vec::with_capacity(names.len());
        for name in names {
            tag_ids.push(Self::find_or_create_tag(&mut *conn, name).await?);
        }

        sqlx::query("DELETE FROM content_tags WHERE content_id = $1")
            .bind(content_id)
            .execute(&mut *conn)
            .await?;

        sqlx::query(
            "INSERT INTO content_tags (content_id, tag_id)
             SELECT $1, UNNEST($2::BIGINT[])
             ON CONFLICT DO NOTHING",
        )
        .bind(content_id)
        .bind(&tag_ids)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Categories attached to a content record, by name.
    pub async fn list_categories_for_content(
        pool: &PgPool,
        content_id: DbId,
    ) -> Result<Vec<Category>, sqlx::Error> {
        let query = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories c
             JOIN content_categories cc ON cc.category_id = c.id
             WHERE cc.content_id = $1
             ORDER BY c.name"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(content_id)
            .fetch_all(pool)
            .await
    }

    /// Tags attached to a content record, by name.
    pub async fn list_tags_for_content(
        pool: &PgPool,
        content_id: DbId,
    ) -> Result<Vec<Tag>, sqlx::Error> {
        let query = format!(
            "SELECT {TAG_COLUMNS} FROM tags t
             JOIN content_tags ct ON ct.tag_id = t.id
             WHERE ct.content_id = $1
             ORDER BY t.name"
        );
        sqlx::query_as::<_, Tag>(&query)
            .bind(content_id)
            .fetch_all(pool)
            .await
    }
}
