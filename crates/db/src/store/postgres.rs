//! Postgres-backed store.
//!
//! Every method delegates to a repository. Transactions wrap a
//! [`sqlx::Transaction`], which rolls back when dropped uncommitted.

use async_trait::async_trait;
use contentflow_core::types::{DbId, Timestamp};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::content::{Content, ContentFilter, ContentPage, NewContent};
use crate::models::content_version::{ContentVersion, NewContentVersion};
use crate::models::taxonomy::{Category, Tag};
use crate::models::webhook::{CreateWebhook, UpdateWebhook, Webhook};
use crate::repositories::{ContentRepo, ContentVersionRepo, TaxonomyRepo, WebhookRepo};
use crate::store::{ContentStore, ContentTx, StoreError, WebhookStore};

/// Store over a shared connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// An open Postgres transaction.
pub struct PgContentTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl ContentStore for PgStore {
    async fn begin(&self) -> Result<Box<dyn ContentTx>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgContentTx { tx }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool).await?;
        Ok(())
    }

    async fn find_content(&self, id: DbId) -> Result<Option<Content>, StoreError> {
        Ok(ContentRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list_content(&self, filter: &ContentFilter) -> Result<ContentPage, StoreError> {
        Ok(ContentRepo::list(&self.pool, filter).await?)
    }

    async fn list_categories_for_content(&self, id: DbId) -> Result<Vec<Category>, StoreError> {
        Ok(TaxonomyRepo::list_categories_for_content(&self.pool, id).await?)
    }

    async fn list_tags_for_content(&self, id: DbId) -> Result<Vec<Tag>, StoreError> {
        Ok(TaxonomyRepo::list_tags_for_content(&self.pool, id).await?)
    }

    async fn list_versions(&self, content_id: DbId) -> Result<Vec<ContentVersion>, StoreError> {
        Ok(ContentVersionRepo::list_by_content(&self.pool, content_id).await?)
    }

    async fn list_due_scheduled(&self, now: Timestamp) -> Result<Vec<Content>, StoreError> {
        Ok(ContentRepo::list_due_scheduled(&self.pool, now).await?)
    }

    async fn publish_scheduled(
        &self,
        id: DbId,
        now: Timestamp,
    ) -> Result<Option<Content>, StoreError> {
        let published = ContentRepo::publish_scheduled(&self.pool, id, now).await?;
        if published.is_none() {
            tracing::debug!(content_id = id, "Scheduled flip matched no row");
        }
        Ok(published)
    }

    async fn soft_delete_content(&self, id: DbId) -> Result<Option<Content>, StoreError> {
        Ok(ContentRepo::soft_delete(&self.pool, id).await?)
    }
}

#[async_trait]
impl ContentTx for PgContentTx {
    async fn lock_content(&mut self, id: DbId) -> Result<Option<Content>, StoreError> {
        Ok(ContentRepo::find_for_update(&mut *self.tx, id).await?)
    }

    async fn find_version(
        &mut self,
        content_id: DbId,
        version: i32,
    ) -> Result<Option<ContentVersion>, StoreError> {
        Ok(ContentVersionRepo::find_by_content_and_version(&mut *self.tx, content_id, version).await?)
    }

    async fn language_exists_in_group(
        &mut self,
        group_id: Uuid,
        language: &str,
    ) -> Result<bool, StoreError> {
        Ok(ContentRepo::language_exists_in_group(&mut *self.tx, group_id, language).await?)
    }

    async fn insert_content(&mut self, input: &NewContent) -> Result<Content, StoreError> {
        Ok(ContentRepo::insert(&mut *self.tx, input).await?)
    }

    async fn insert_version(
        &mut self,
        snapshot: &NewContentVersion,
    ) -> Result<ContentVersion, StoreError> {
        Ok(ContentVersionRepo::create(&mut *self.tx, snapshot).await?)
    }

    async fn save_content(&mut self, content: &Content) -> Result<Content, StoreError> {
        Ok(ContentRepo::save(&mut *self.tx, content).await?)
    }

    async fn replace_categories(
        &mut self,
        content_id: DbId,
        category_ids: &[DbId],
    ) -> Result<(), StoreError> {
        Ok(TaxonomyRepo::replace_categories(&mut self.tx, content_id, category_ids).await?)
    }

    async fn replace_tags(&mut self, content_id: DbId, names: &[String]) -> Result<(), StoreError> {
        Ok(TaxonomyRepo::replace_tags(&mut self.tx, content_id, names).await?)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl WebhookStore for PgStore {
    async fn create_webhook(&self, input: &CreateWebhook) -> Result<Webhook, StoreError> {
        Ok(WebhookRepo::create(&self.pool, input).await?)
    }

    async fn list_webhooks(&self) -> Result<Vec<Webhook>, StoreError> {
        Ok(WebhookRepo::list(&self.pool).await?)
    }

    async fn list_enabled_webhooks(&self) -> Result<Vec<Webhook>, StoreError> {
        Ok(WebhookRepo::list_enabled(&self.pool).await?)
    }

    async fn find_webhook(&self, id: DbId) -> Result<Option<Webhook>, StoreError> {
        Ok(WebhookRepo::find_by_id(&self.pool, id).await?)
    }

    async fn update_webhook(
        &self,
        id: DbId,
        input: &UpdateWebhook,
    ) -> Result<Option<Webhook>, StoreError> {
        Ok(WebhookRepo::update(&self.pool, id, input).await?)
    }

    async fn delete_webhook(&self, id: DbId) -> Result<bool, StoreError> {
        Ok(WebhookRepo::delete(&self.pool, id).await?)
    }
}
