//! Category and tag models.
//!
//! Both are managed outside the content engine; the engine only reads them
//! and replaces a content record's associations.

use contentflow_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `categories` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Category {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub created_at: Timestamp,
}

/// A row from the `tags` table. Tags are created on first use with
/// `slug = name`.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Tag {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub created_at: Timestamp,
}
