//! Versioned content lifecycle.
//!
//! Every update snapshots the pre-change state, applies the change and bumps
//! `version` by one inside a single store transaction. Creation and
//! translation start a record at version 1; soft delete leaves the version
//! alone.

use contentflow_core::content::{
    non_empty, validate_language, validate_slug, ContentStatus, DEFAULT_LANGUAGE,
    MIN_TITLE_LENGTH,
};
use contentflow_core::error::CoreError;
use contentflow_core::event_names::{CONTENT_CREATE, CONTENT_DELETE, CONTENT_UPDATE};
use contentflow_core::search::MAX_PAGE_LIMIT;
use contentflow_core::types::DbId;
use contentflow_db::models::content::{
    Content, ContentChanges, ContentDetail, ContentFilter, ContentPage, CreateContent, NewContent,
};
use contentflow_db::models::content_version::{ContentVersion, NewContentVersion};
use contentflow_db::store::ContentTx;
use uuid::Uuid;

use crate::{content_not_found, ContentError, ContentService};

impl ContentService {
    /// Create a record at version 1.
    ///
    /// Language defaults to `en` and a fresh group id is generated unless the
    /// caller joins an existing group. Categories and tags are attached in
    /// the same transaction.
    pub async fn create(
        &self,
        input: CreateContent,
        author_id: Option<DbId>,
    ) -> Result<Content, ContentError> {
        let language = non_empty(input.language.as_deref())
            .unwrap_or(DEFAULT_LANGUAGE)
            .to_string();
        let status = validate_create(&input, &language)?;
        let group_id = input.group_id.unwrap_or_else(Uuid::new_v4);
        let new = new_content(&input, status, language, group_id, author_id);

        let mut tx = self.store.begin().await?;
        let content = tx.insert_content(&new).await?;
        attach_taxonomies(&mut *tx, content.id, &input.category_ids, &input.tags).await?;
        tx.commit().await?;

        tracing::info!(
            content_id = content.id,
            slug = %content.slug,
            language = %content.language,
            "Content created"
        );
        self.notify(CONTENT_CREATE, &content);
        Ok(content)
    }

    /// Create a translation of `original_id` in the language named by
    /// `input.language`. The translation joins the original's group at
    /// version 1.
    pub async fn add_translation(
        &self,
        original_id: DbId,
        input: CreateContent,
    ) -> Result<Content, ContentError> {
        let language = non_empty(input.language.as_deref())
            .ok_or_else(|| CoreError::Validation("Translation language is required".into()))?
            .to_string();
        let status = validate_create(&input, &language)?;

        let mut tx = self.store.begin().await?;
        let original = tx
            .lock_content(original_id)
            .await?
            .ok_or_else(|| content_not_found(original_id))?;
        if tx
            .language_exists_in_group(original.group_id, &language)
            .await?
        {
            return Err(CoreError::Conflict(format!(
                "A translation for language '{language}' already exists"
            ))
            .into());
        }

        let new = new_content(&input, status, language, original.group_id, original.author_id);
        let content = tx.insert_content(&new).await?;
        attach_taxonomies(&mut *tx, content.id, &input.category_ids, &input.tags).await?;
        tx.commit().await?;

        tracing::info!(
            content_id = content.id,
            original_id,
            language = %content.language,
            "Translation created"
        );
        self.notify(CONTENT_CREATE, &content);
        Ok(content)
    }

    /// Load a live record with its categories and tags.
    pub async fn get(&self, id: DbId) -> Result<ContentDetail, ContentError> {
        let content = self
            .store
            .find_content(id)
            .await?
            .ok_or_else(|| content_not_found(id))?;
        let categories = self.store.list_categories_for_content(id).await?;
        let tags = self.store.list_tags_for_content(id).await?;
        Ok(ContentDetail {
            content,
            categories,
            tags,
        })
    }

    pub async fn list(&self, mut filter: ContentFilter) -> Result<ContentPage, ContentError> {
        filter.limit = filter.limit.clamp(1, MAX_PAGE_LIMIT);
        filter.offset = filter.offset.max(0);
        Ok(self.store.list_content(&filter).await?)
    }

    /// Snapshots of a live record, newest version first.
    pub async fn history(&self, id: DbId) -> Result<Vec<ContentVersion>, ContentError> {
        if self.store.find_content(id).await?.is_none() {
            return Err(content_not_found(id));
        }
        Ok(self.store.list_versions(id).await?)
    }

    /// Apply `changes` as a new version.
    ///
    /// The pre-change state is stored as a snapshot tagged with the current
    /// version, then `version` is incremented. Absent and empty fields are
    /// left as they are; categories and tags are replaced only when a
    /// non-empty list is given. Nothing is written if any step fails.
    pub async fn update(&self, id: DbId, changes: ContentChanges) -> Result<Content, ContentError> {
        let status = validate_changes(&changes)?;

        let mut tx = self.store.begin().await?;
        let current = tx
            .lock_content(id)
            .await?
            .ok_or_else(|| content_not_found(id))?;

        let mut next = current.clone();
        apply_changes(&mut next, &changes, status);
        require_publish_date(&next.status, next.published_at.is_some())?;
        next.version = current.version + 1;

        tx.insert_version(&NewContentVersion::before_update(&current))
            .await?;
        let content = tx.save_content(&next).await?;

        if let Some(category_ids) = changes.category_ids.as_deref().filter(|ids| !ids.is_empty()) {
            tx.replace_categories(id, category_ids).await?;
        }
        if let Some(tags) = changes.tags.as_deref() {
            let names = tag_names(tags);
            if !names.is_empty() {
                tx.replace_tags(id, &names).await?;
            }
        }
        tx.commit().await?;

        tracing::info!(content_id = id, version = content.version, "Content updated");
        self.notify(CONTENT_UPDATE, &content);
        Ok(content)
    }

    /// Soft-delete a record. History is kept.
    pub async fn delete(&self, id: DbId) -> Result<(), ContentError> {
        let content = self
            .store
            .soft_delete_content(id)
            .await?
            .ok_or_else(|| content_not_found(id))?;

        tracing::info!(content_id = id, "Content deleted");
        self.notify(CONTENT_DELETE, &content);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn validate_title(title: &str) -> Result<(), CoreError> {
    if title.trim().chars().count() < MIN_TITLE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Title must be at least {MIN_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}

fn require_publish_date(status: &str, has_date: bool) -> Result<(), CoreError> {
    if status == ContentStatus::Scheduled.as_str() && !has_date {
        return Err(CoreError::Validation(
            "Scheduled content requires published_at".into(),
        ));
    }
    Ok(())
}

/// Check a create request and resolve its status (`draft` when omitted).
fn validate_create(input: &CreateContent, language: &str) -> Result<ContentStatus, CoreError> {
    validate_title(&input.title)?;
    validate_slug(&input.slug)?;
    validate_language(language)?;
    if input.content_type.trim().is_empty() {
        return Err(CoreError::Validation("Content type is required".into()));
    }
    let status = match non_empty(Some(input.status.as_str())) {
        Some(status) => ContentStatus::parse(status)?,
        None => ContentStatus::Draft,
    };
    require_publish_date(status.as_str(), input.published_at.is_some())?;
    Ok(status)
}

/// Check the present fields of an update and parse its status, if any.
fn validate_changes(changes: &ContentChanges) -> Result<Option<ContentStatus>, CoreError> {
    if let Some(title) = non_empty(changes.title.as_deref()) {
        validate_title(title)?;
    }
    if let Some(language) = non_empty(changes.language.as_deref()) {
        validate_language(language)?;
    }
    non_empty(changes.status.as_deref())
        .map(ContentStatus::parse)
        .transpose()
}

fn new_content(
    input: &CreateContent,
    status: ContentStatus,
    language: String,
    group_id: Uuid,
    author_id: Option<DbId>,
) -> NewContent {
    NewContent {
        title: input.title.trim().to_string(),
        slug: input.slug.clone(),
        body: input.body.clone(),
        content_type: input.content_type.trim().to_string(),
        attributes: input.attributes.clone(),
        status: status.as_str().to_string(),
        language,
        group_id,
        author_id,
        published_at: input.published_at,
        blocks: input.blocks.clone(),
    }
}

fn apply_changes(content: &mut Content, changes: &ContentChanges, status: Option<ContentStatus>) {
    let text_fields = [
        (&mut content.title, &changes.title),
        (&mut content.body, &changes.body),
        (&mut content.content_type, &changes.content_type),
        (&mut content.attributes, &changes.attributes),
        (&mut content.language, &changes.language),
    ];
    for (field, change) in text_fields {
        if let Some(value) = non_empty(change.as_deref()) {
            *field = value.to_string();
        }
    }
    if let Some(status) = status {
        content.status = status.as_str().to_string();
    }
    if let Some(published_at) = changes.published_at {
        content.published_at = Some(published_at);
    }
    if let Some(blocks) = &changes.blocks {
        content.blocks = Some(blocks.clone());
    }
}

/// Trim tag names, dropping blanks and duplicates while keeping order.
fn tag_names(tags: &[String]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if !names.iter().any(|n| n == tag) {
            names.push(tag.to_string());
        }
    }
    names
}

async fn attach_taxonomies(
    tx: &mut dyn ContentTx,
    content_id: DbId,
    category_ids: &[DbId],
    tags: &[String],
) -> Result<(), ContentError> {
    if !category_ids.is_empty() {
        tx.replace_categories(content_id, category_ids).await?;
    }
    let names = tag_names(tags);
    if !names.is_empty() {
        tx.replace_tags(content_id, &names).await?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
