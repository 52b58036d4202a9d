//! Content entity model and DTOs.

use contentflow_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::taxonomy::{Category, Tag};

/// A row from the `contents` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Content {
    pub id: DbId,
    pub title: String,
    pub slug: String,
    pub body: String,
    #[serde(rename = "type")]
    pub content_type: String,
    /// Free-form attribute blob, usually a JSON document encoded as text.
    pub attributes: String,
    pub status: String,
    pub language: String,
    /// Shared by all translations of the same logical item.
    pub group_id: Uuid,
    pub version: i32,
    pub author_id: Option<DbId>,
    pub published_at: Option<Timestamp>,
    pub blocks: Option<serde_json::Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(skip_serializing, default)]
    pub deleted_at: Option<Timestamp>,
}

/// A content record together with its taxonomy associations.
#[derive(Debug, Clone, Serialize)]
pub struct ContentDetail {
    #[serde(flatten)]
    pub content: Content,
    pub categories: Vec<Category>,
    pub tags: Vec<Tag>,
}

/// DTO for creating content (or a translation of existing content).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateContent {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub body: String,
    #[serde(rename = "type")]
    pub content_type: String,
    #[serde(default)]
    pub attributes: String,
    /// Empty means `draft`.
    #[serde(default)]
    pub status: String,
    pub language: Option<String>,
    /// Join an existing translation group instead of starting a new one.
    pub group_id: Option<Uuid>,
    pub published_at: Option<Timestamp>,
    pub blocks: Option<serde_json::Value>,
    #[serde(default)]
    pub category_ids: Vec<DbId>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Fully resolved insert record: defaults applied, group assigned.
#[derive(Debug, Clone)]
pub struct NewContent {
    pub title: String,
    pub slug: String,
    pub body: String,
    pub content_type: String,
    pub attributes: String,
    pub status: String,
    pub language: String,
    pub group_id: Uuid,
    pub author_id: Option<DbId>,
    pub published_at: Option<Timestamp>,
    pub blocks: Option<serde_json::Value>,
}

/// Sparse change set for a versioned update. `None` and empty strings leave
/// the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentChanges {
    pub title: Option<String>,
    pub body: Option<String>,
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    pub attributes: Option<String>,
    pub status: Option<String>,
    pub language: Option<String>,
    pub published_at: Option<Timestamp>,
    pub blocks: Option<serde_json::Value>,
    /// Replaces category associations wholesale when non-empty.
    pub category_ids: Option<Vec<DbId>>,
    /// Replaces tag associations wholesale when non-empty.
    pub tags: Option<Vec<String>>,
}

/// Filters for listing content. All string filters are exact except
/// `search`, which is a case-insensitive substring match on title or body.
#[derive(Debug, Clone, Default)]
pub struct ContentFilter {
    pub search: Option<String>,
    pub content_type: Option<String>,
    pub status: Option<String>,
    pub language: Option<String>,
    /// Matches content carrying any of these tag names.
    pub tags: Vec<String>,
    pub limit: i64,
    pub offset: i64,
}

/// One page of content plus the unpaginated total.
#[derive(Debug, Clone, Serialize)]
pub struct ContentPage {
    pub items: Vec<Content>,
    pub total: i64,
}
