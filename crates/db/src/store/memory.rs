//! In-memory store.
//!
//! Holds every table in a single [`MemoryState`] behind an async mutex. A
//! transaction takes the mutex for its whole lifetime and works on a copy of
//! the state; `commit` writes the copy back and dropping the transaction
//! discards it. Transactions are therefore fully serialised, which is a
//! stronger guarantee than the per-row locks [`PgStore`](super::PgStore)
//! takes.
//!
//! Unique constraints mirror the Postgres schema and surface as
//! [`StoreError::Conflict`] with the same constraint names.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use contentflow_core::content::ContentStatus;
use contentflow_core::types::{DbId, Timestamp};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::models::content::{Content, ContentFilter, ContentPage, NewContent};
use crate::models::content_version::{ContentVersion, NewContentVersion};
use crate::models::taxonomy::{Category, Tag};
use crate::models::webhook::{CreateWebhook, UpdateWebhook, Webhook};
use crate::store::{
    ContentStore, ContentTx, StoreError, WebhookStore, UQ_CONTENTS_GROUP_LANGUAGE,
    UQ_CONTENTS_SLUG_LANGUAGE, UQ_CONTENT_VERSIONS_CONTENT_VERSION,
};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone)]
struct MemoryState {
    last_id: DbId,
    contents: BTreeMap<DbId, Content>,
    versions: Vec<ContentVersion>,
    categories: BTreeMap<DbId, Category>,
    tags: BTreeMap<DbId, Tag>,
    content_categories: BTreeSet<(DbId, DbId)>,
    content_tags: BTreeSet<(DbId, DbId)>,
    webhooks: BTreeMap<DbId, Webhook>,
    /// Content ids whose writes fail with an injected database error.
    failing_ids: BTreeSet<DbId>,
}

impl MemoryState {
    fn next_id(&mut self) -> DbId {
        self.last_id += 1;
        self.last_id
    }

    fn live(&self, id: DbId) -> Option<&Content> {
        self.contents.get(&id).filter(|c| c.deleted_at.is_none())
    }

    fn check_writable(&self, id: DbId) -> Result<(), StoreError> {
        if self.failing_ids.contains(&id) {
            return Err(StoreError::Database(sqlx::Error::Protocol(format!(
                "injected write failure for content {id}"
            ))));
        }
        Ok(())
    }

    /// Enforce the partial unique indexes on live content, ignoring `exclude`.
    fn check_unique(
        &self,
        exclude: Option<DbId>,
        slug: &str,
        language: &str,
        group_id: Uuid,
    ) -> Result<(), StoreError> {
        let others = self
            .contents
            .values()
            .filter(|c| c.deleted_at.is_none() && Some(c.id) != exclude);
        for other in others {
            if other.language == language {
                if other.slug == slug {
                    return Err(StoreError::Conflict(UQ_CONTENTS_SLUG_LANGUAGE.into()));
                }
                if other.group_id == group_id {
                    return Err(StoreError::Conflict(UQ_CONTENTS_GROUP_LANGUAGE.into()));
                }
            }
        }
        Ok(())
    }

    fn tag_names_for(&self, content_id: DbId) -> impl Iterator<Item = &str> + '_ {
        self.content_tags
            .iter()
            .filter(move |(cid, _)| *cid == content_id)
            .filter_map(|(_, tid)| self.tags.get(tid).map(|t| t.name.as_str()))
    }

    fn matches(&self, content: &Content, filter: &ContentFilter) -> bool {
        if content.deleted_at.is_some() {
            return false;
        }
        if let Some(search) = &filter.search {
            let needle = search.to_lowercase();
            if !content.title.to_lowercase().contains(&needle)
                && !content.body.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        let differs =
            |wanted: &Option<String>, actual: &str| wanted.as_deref().is_some_and(|w| w != actual);
        if differs(&filter.content_type, &content.content_type)
            || differs(&filter.status, &content.status)
            || differs(&filter.language, &content.language)
        {
            return false;
        }
        if !filter.tags.is_empty()
            && !self
                .tag_names_for(content.id)
                .any(|name| filter.tags.iter().any(|t| t == name))
        {
            return false;
        }
        true
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Store that keeps everything in process memory.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a category. Categories are managed outside the engine, so the
    /// store traits have no way to create them.
    pub async fn insert_category(&self, name: &str, slug: &str) -> Category {
        let mut state = self.state.lock().await;
        let category = Category {
            id: state.next_id(),
            name: name.to_string(),
            slug: slug.to_string(),
            created_at: Utc::now(),
        };
        state.categories.insert(category.id, category.clone());
        category
    }

    /// Make every write touching `content_id` fail until cleared.
    pub async fn fail_writes_for(&self, content_id: DbId) {
        self.state.lock().await.failing_ids.insert(content_id);
    }

    /// Undo [`fail_writes_for`](Self::fail_writes_for).
    pub async fn clear_failures(&self) {
        self.state.lock().await.failing_ids.clear();
    }

    /// Total number of snapshots across all content.
    pub async fn version_count(&self) -> usize {
        self.state.lock().await.versions.len()
    }
}

/// A transaction over a private copy of the state.
pub struct MemoryContentTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn ContentTx>, StoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryContentTx { guard, working }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn find_content(&self, id: DbId) -> Result<Option<Content>, StoreError> {
        Ok(self.state.lock().await.live(id).cloned())
    }

    async fn list_content(&self, filter: &ContentFilter) -> Result<ContentPage, StoreError> {
        let state = self.state.lock().await;
        let mut matching: Vec<&Content> = state
            .contents
            .values()
            .filter(|c| state.matches(c, filter))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .cloned()
            .collect();
        Ok(ContentPage { items, total })
    }

    async fn list_categories_for_content(&self, id: DbId) -> Result<Vec<Category>, StoreError> {
        let state = self.state.lock().await;
        let mut categories: Vec<Category> = state
            .content_categories
            .iter()
            .filter(|(cid, _)| *cid == id)
            .filter_map(|(_, cat)| state.categories.get(cat).cloned())
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn list_tags_for_content(&self, id: DbId) -> Result<Vec<Tag>, StoreError> {
        let state = self.state.lock().await;
        let mut tags: Vec<Tag> = state
            .content_tags
            .iter()
            .filter(|(cid, _)| *cid == id)
            .filter_map(|(_, tid)| state.tags.get(tid).cloned())
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn list_versions(&self, content_id: DbId) -> Result<Vec<ContentVersion>, StoreError> {
        let state = self.state.lock().await;
        let mut versions: Vec<ContentVersion> = state
            .versions
            .iter()
            .filter(|v| v.content_id == content_id)
            .cloned()
            .collect();
        versions.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(versions)
    }

    async fn list_due_scheduled(&self, now: Timestamp) -> Result<Vec<Content>, StoreError> {
        let state = self.state.lock().await;
        let mut due: Vec<Content> = state
            .contents
            .values()
            .filter(|c| {
                c.deleted_at.is_none()
                    && c.status == ContentStatus::Scheduled.as_str()
                    && c.published_at.is_some_and(|at| at <= now)
            })
            .cloned()
            .collect();
        due.sort_by(|a, b| a.published_at.cmp(&b.published_at).then(a.id.cmp(&b.id)));
        Ok(due)
    }

    async fn publish_scheduled(
        &self,
        id: DbId,
        now: Timestamp,
    ) -> Result<Option<Content>, StoreError> {
        let mut state = self.state.lock().await;
        state.check_writable(id)?;
        let Some(content) = state.contents.get_mut(&id) else {
            return Ok(None);
        };
        let due = content.published_at.is_some_and(|at| at <= now);
        if content.deleted_at.is_some()
            || content.status != ContentStatus::Scheduled.as_str()
            || !due
        {
            return Ok(None);
        }
        content.status = ContentStatus::Published.as_str().to_string();
        content.updated_at = Utc::now();
        Ok(Some(content.clone()))
    }

    async fn soft_delete_content(&self, id: DbId) -> Result<Option<Content>, StoreError> {
        let mut state = self.state.lock().await;
        state.check_writable(id)?;
        let Some(content) = state.contents.get_mut(&id).filter(|c| c.deleted_at.is_none()) else {
            return Ok(None);
        };
        let now = Utc::now();
        content.deleted_at = Some(now);
        content.updated_at = now;
        Ok(Some(content.clone()))
    }
}

#[async_trait]
impl ContentTx for MemoryContentTx {
    async fn lock_content(&mut self, id: DbId) -> Result<Option<Content>, StoreError> {
        Ok(self.working.live(id).cloned())
    }

    async fn find_version(
        &mut self,
        content_id: DbId,
        version: i32,
    ) -> Result<Option<ContentVersion>, StoreError> {
        Ok(self
            .working
            .versions
            .iter()
            .find(|v| v.content_id == content_id && v.version == version)
            .cloned())
    }

    async fn language_exists_in_group(
        &mut self,
        group_id: Uuid,
        language: &str,
    ) -> Result<bool, StoreError> {
        Ok(self
            .working
            .contents
            .values()
            .any(|c| c.deleted_at.is_none() && c.group_id == group_id && c.language == language))
    }

    async fn insert_content(&mut self, input: &NewContent) -> Result<Content, StoreError> {
        self.working
            .check_unique(None, &input.slug, &input.language, input.group_id)?;
        let now = Utc::now();
        let content = Content {
            id: self.working.next_id(),
            title: input.title.clone(),
            slug: input.slug.clone(),
            body: input.body.clone(),
            content_type: input.content_type.clone(),
            attributes: input.attributes.clone(),
            status: input.status.clone(),
            language: input.language.clone(),
            group_id: input.group_id,
            version: 1,
            author_id: input.author_id,
            published_at: input.published_at,
            blocks: input.blocks.clone(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.working.contents.insert(content.id, content.clone());
        Ok(content)
    }

    async fn insert_version(
        &mut self,
        snapshot: &NewContentVersion,
    ) -> Result<ContentVersion, StoreError> {
        let duplicate = self
            .working
            .versions
            .iter()
            .any(|v| v.content_id == snapshot.content_id && v.version == snapshot.version);
        if duplicate {
            return Err(StoreError::Conflict(UQ_CONTENT_VERSIONS_CONTENT_VERSION.into()));
        }
        let version = ContentVersion {
            id: self.working.next_id(),
            content_id: snapshot.content_id,
            version: snapshot.version,
            title: snapshot.title.clone(),
            body: snapshot.body.clone(),
            content_type: snapshot.content_type.clone(),
            attributes: snapshot.attributes.clone(),
            status: snapshot.status.clone(),
            language: snapshot.language.clone(),
            blocks: snapshot.blocks.clone(),
            change_kind: snapshot.change_kind.to_string(),
            reverted_to: snapshot.reverted_to,
            changed_at: Utc::now(),
        };
        self.working.versions.push(version.clone());
        Ok(version)
    }

    async fn save_content(&mut self, content: &Content) -> Result<Content, StoreError> {
        self.working.check_writable(content.id)?;
        let Some(stored) = self.working.live(content.id).cloned() else {
            return Err(StoreError::Database(sqlx::Error::RowNotFound));
        };
        self.working.check_unique(
            Some(content.id),
            &stored.slug,
            &content.language,
            stored.group_id,
        )?;

        let saved = Content {
            title: content.title.clone(),
            body: content.body.clone(),
            content_type: content.content_type.clone(),
            attributes: content.attributes.clone(),
            status: content.status.clone(),
            language: content.language.clone(),
            version: content.version,
            published_at: content.published_at,
            blocks: content.blocks.clone(),
            updated_at: Utc::now(),
            ..stored
        };
        self.working.contents.insert(saved.id, saved.clone());
        Ok(saved)
    }

    async fn replace_categories(
        &mut self,
        content_id: DbId,
        category_ids: &[DbId],
    ) -> Result<(), StoreError> {
        let state = &mut self.working;
        state.content_categories.retain(|(cid, _)| *cid != content_id);
        for category_id in category_ids {
            if state.categories.contains_key(category_id) {
                state.content_categories.insert((content_id, *category_id));
            }
        }
        Ok(())
    }

    async fn replace_tags(&mut self, content_id: DbId, names: &[String]) -> Result<(), StoreError> {
        let state = &mut self.working;
        let mut tag_ids = Vec::with_capacity(names.len());
        for name in names {
            let existing = state.tags.values().find(|t| &t.name == name).map(|t| t.id);
            let id = match existing {
                Some(id) => id,
                None => {
                    let tag = Tag {
                        id: state.next_id(),
                        name: name.clone(),
                        slug: name.clone(),
                        created_at: Utc::now(),
                    };
                    let id = tag.id;
                    state.tags.insert(id, tag);
                    id
                }
            };
            tag_ids.push(id);
        }
        state.content_tags.retain(|(cid, _)| *cid != content_id);
        for tag_id in tag_ids {
            state.content_tags.insert((content_id, tag_id));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryContentTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}

#[async_trait]
impl WebhookStore for MemoryStore {
    async fn create_webhook(&self, input: &CreateWebhook) -> Result<Webhook, StoreError> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let webhook = Webhook {
            id: state.next_id(),
            url: input.url.clone(),
            events: input.events.clone(),
            is_enabled: input.is_enabled.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };
        state.webhooks.insert(webhook.id, webhook.clone());
        Ok(webhook)
    }

    async fn list_webhooks(&self) -> Result<Vec<Webhook>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.webhooks.values().rev().cloned().collect())
    }

    async fn list_enabled_webhooks(&self) -> Result<Vec<Webhook>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .webhooks
            .values()
            .filter(|w| w.is_enabled)
            .cloned()
            .collect())
    }

    async fn find_webhook(&self, id: DbId) -> Result<Option<Webhook>, StoreError> {
        Ok(self.state.lock().await.webhooks.get(&id).cloned())
    }

    async fn update_webhook(
        &self,
        id: DbId,
        input: &UpdateWebhook,
    ) -> Result<Option<Webhook>, StoreError> {
        let mut state = self.state.lock().await;
        let Some(webhook) = state.webhooks.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(url) = &input.url {
            webhook.url = url.clone();
        }
        if let Some(events) = &input.events {
            webhook.events = events.clone();
        }
        if let Some(is_enabled) = input.is_enabled {
            webhook.is_enabled = is_enabled;
        }
        webhook.updated_at = Utc::now();
        Ok(Some(webhook.clone()))
    }

    async fn delete_webhook(&self, id: DbId) -> Result<bool, StoreError> {
        Ok(self.state.lock().await.webhooks.remove(&id).is_some())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
