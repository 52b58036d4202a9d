//! Transactional record store.
//!
//! The content engine talks to persistence only through these traits so it
//! can run against Postgres ([`PgStore`]) in production and against
//! [`MemoryStore`] in tests.
//!
//! A [`ContentTx`] is a scoped transaction: dropping it without calling
//! [`ContentTx::commit`] rolls back every write made through it, so early
//! returns via `?` never leave partial state behind.

use async_trait::async_trait;
use contentflow_core::types::{DbId, Timestamp};
use uuid::Uuid;

use crate::models::content::{Content, ContentFilter, ContentPage, NewContent};
use crate::models::content_version::{ContentVersion, NewContentVersion};
use crate::models::taxonomy::{Category, Tag};
use crate::models::webhook::{CreateWebhook, UpdateWebhook, Webhook};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

// ---------------------------------------------------------------------------
// Constraint names
// ---------------------------------------------------------------------------

/// `(slug, language)` is unique among live content.
pub const UQ_CONTENTS_SLUG_LANGUAGE: &str = "uq_contents_slug_language";

/// One live translation per language within a group.
pub const UQ_CONTENTS_GROUP_LANGUAGE: &str = "uq_contents_group_language";

/// One snapshot per represented version of a content record.
pub const UQ_CONTENT_VERSIONS_CONTENT_VERSION: &str = "uq_content_versions_content_version";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// PostgreSQL `unique_violation`.
const PG_UNIQUE_VIOLATION: &str = "23505";

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write. Carries the constraint name.
    #[error("Duplicate value violates unique constraint: {0}")]
    Conflict(String),

    /// Any other database failure.
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(PG_UNIQUE_VIOLATION) {
                let constraint = db_err.constraint().unwrap_or("unknown").to_string();
                tracing::debug!(constraint = %constraint, "Unique constraint violated");
                return StoreError::Conflict(constraint);
            }
        }
        StoreError::Database(err)
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Content persistence, shared by request handlers and the scheduler.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Open a transaction. The returned handle rolls back on drop.
    async fn begin(&self) -> Result<Box<dyn ContentTx>, StoreError>;

    /// Verify the backing store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Find a live (not soft-deleted) record.
    async fn find_content(&self, id: DbId) -> Result<Option<Content>, StoreError>;

    /// List live records matching `filter`, newest first.
    async fn list_content(&self, filter: &ContentFilter) -> Result<ContentPage, StoreError>;

    async fn list_categories_for_content(&self, id: DbId) -> Result<Vec<Category>, StoreError>;

    async fn list_tags_for_content(&self, id: DbId) -> Result<Vec<Tag>, StoreError>;

    /// All snapshots of a record, ordered by version descending.
    async fn list_versions(&self, content_id: DbId) -> Result<Vec<ContentVersion>, StoreError>;

    /// Live records with status `scheduled` and `published_at <= now`.
    async fn list_due_scheduled(&self, now: Timestamp) -> Result<Vec<Content>, StoreError>;

    /// Atomically flip one scheduled record to published if it is still due
    /// at `now`. `None` when the record is missing, no longer scheduled, or
    /// its `published_at` is now after `now`.
    async fn publish_scheduled(
        &self,
        id: DbId,
        now: Timestamp,
    ) -> Result<Option<Content>, StoreError>;

    /// Soft-delete a record, returning it. `None` when missing.
    async fn soft_delete_content(&self, id: DbId) -> Result<Option<Content>, StoreError>;
}

/// Writes performed inside one store transaction.
#[async_trait]
pub trait ContentTx: Send {
    /// Load a live record and hold it exclusively until commit or rollback.
    async fn lock_content(&mut self, id: DbId) -> Result<Option<Content>, StoreError>;

    /// Find the snapshot representing `version` of a record.
    async fn find_version(
        &mut self,
        content_id: DbId,
        version: i32,
    ) -> Result<Option<ContentVersion>, StoreError>;

    /// Whether a live record in `group_id` already uses `language`.
    async fn language_exists_in_group(
        &mut self,
        group_id: Uuid,
        language: &str,
    ) -> Result<bool, StoreError>;

    /// Insert a new record at version 1.
    async fn insert_content(&mut self, input: &NewContent) -> Result<Content, StoreError>;

    /// Append a snapshot.
    async fn insert_version(
        &mut self,
        snapshot: &NewContentVersion,
    ) -> Result<ContentVersion, StoreError>;

    /// Persist every mutable field of `content`.
    async fn save_content(&mut self, content: &Content) -> Result<Content, StoreError>;

    /// Replace category associations with the existing ids in `category_ids`.
    async fn replace_categories(
        &mut self,
        content_id: DbId,
        category_ids: &[DbId],
    ) -> Result<(), StoreError>;

    /// Replace tag associations, creating unknown tag names.
    async fn replace_tags(&mut self, content_id: DbId, names: &[String]) -> Result<(), StoreError>;

    /// Make every write in this transaction visible.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

/// Webhook registrations.
#[async_trait]
pub trait WebhookStore: Send + Sync {
    async fn create_webhook(&self, input: &CreateWebhook) -> Result<Webhook, StoreError>;

    async fn list_webhooks(&self) -> Result<Vec<Webhook>, StoreError>;

    /// Enabled webhooks only, in registration order.
    async fn list_enabled_webhooks(&self) -> Result<Vec<Webhook>, StoreError>;

    async fn find_webhook(&self, id: DbId) -> Result<Option<Webhook>, StoreError>;

    async fn update_webhook(
        &self,
        id: DbId,
        input: &UpdateWebhook,
    ) -> Result<Option<Webhook>, StoreError>;

    async fn delete_webhook(&self, id: DbId) -> Result<bool, StoreError>;
}
