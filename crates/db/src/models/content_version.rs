//! Content version snapshot model.
//!
//! Snapshots are immutable copies of a content record's versioned fields,
//! taken immediately before each update or revert.

use contentflow_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::content::Content;

/// Snapshot produced by a regular update.
pub const CHANGE_KIND_UPDATE: &str = "update";

/// Snapshot of the state abandoned by a revert.
pub const CHANGE_KIND_REVERT: &str = "revert";

/// A row from the `content_versions` table.
///
/// `id` is the snapshot's own identifier; `version` is the live version the
/// content had when the snapshot was taken.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ContentVersion {
    pub id: DbId,
    pub content_id: DbId,
    pub version: i32,
    pub title: String,
    pub body: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub attributes: String,
    pub status: String,
    pub language: String,
    pub blocks: Option<serde_json::Value>,
    pub change_kind: String,
    pub reverted_to: Option<i32>,
    pub changed_at: Timestamp,
}

/// Insert record for a snapshot.
#[derive(Debug, Clone)]
pub struct NewContentVersion {
    pub content_id: DbId,
    pub version: i32,
    pub title: String,
    pub body: String,
    pub content_type: String,
    pub attributes: String,
    pub status: String,
    pub language: String,
    pub blocks: Option<serde_json::Value>,
    pub change_kind: &'static str,
    pub reverted_to: Option<i32>,
}

impl NewContentVersion {
    /// Capture the current versioned fields of `content` before an update.
    pub fn before_update(content: &Content) -> Self {
        Self::capture(content, CHANGE_KIND_UPDATE, None)
    }

    /// Capture the current versioned fields of `content` before it is
    /// reverted to `target_version`.
    pub fn before_revert(content: &Content, target_version: i32) -> Self {
        Self::capture(content, CHANGE_KIND_REVERT, Some(target_version))
    }

    fn capture(content: &Content, change_kind: &'static str, reverted_to: Option<i32>) -> Self {
        Self {
            content_id: content.id,
            version: content.version,
            title: content.title.clone(),
            body: content.body.clone(),
            content_type: content.content_type.clone(),
            attributes: content.attributes.clone(),
            status: content.status.clone(),
            language: content.language.clone(),
            blocks: content.blocks.clone(),
            change_kind,
            reverted_to,
        }
    }
}
