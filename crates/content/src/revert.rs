//! Revert to an earlier snapshot.
//!
//! A revert never rewinds the version counter. The abandoned state is
//! snapshotted (tagged `revert`) and the target snapshot's fields become the
//! next version, so both the bad and the restored state stay in history.

use contentflow_core::event_names::CONTENT_REVERT;
use contentflow_core::types::DbId;
use contentflow_db::models::content::Content;
use contentflow_db::models::content_version::{ContentVersion, NewContentVersion};

use crate::{content_not_found, ContentError, ContentService};

impl ContentService {
    /// Restore the fields recorded in snapshot `target_version` as a new
    /// version of `id`.
    pub async fn revert(&self, id: DbId, target_version: i32) -> Result<Content, ContentError> {
        let mut tx = self.store.begin().await?;
        let current = tx
            .lock_content(id)
            .await?
            .ok_or_else(|| content_not_found(id))?;
        let target = tx
            .find_version(id, target_version)
            .await?
            .ok_or(ContentError::VersionNotFound {
                content_id: id,
                version: target_version,
            })?;

        tx.insert_version(&NewContentVersion::before_revert(&current, target_version))
            .await?;
        let mut next = restore(&current, &target);
        next.version = current.version + 1;
        let content = tx.save_content(&next).await?;
        tx.commit().await?;

        tracing::info!(
            content_id = id,
            reverted_to = target_version,
            version = content.version,
            "Content reverted"
        );
        self.notify(CONTENT_REVERT, &content);
        Ok(content)
    }
}

/// `current` with every versioned field taken from `snapshot`.
fn restore(current: &Content, snapshot: &ContentVersion) -> Content {
    Content {
        title: snapshot.title.clone(),
        body: snapshot.body.clone(),
        content_type: snapshot.content_type.clone(),
        attributes: snapshot.attributes.clone(),
        status: snapshot.status.clone(),
        language: snapshot.language.clone(),
        blocks: snapshot.blocks.clone(),
        ..current.clone()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    #[test]
    fn restore_keeps_identity_and_copies_versioned_fields() {
        let now = Utc::now();
        let current = Content {
            id: 9,
            title: "Broken".into(),
            slug: "post".into(),
            body: "oops".into(),
            content_type: "blog".into(),
            attributes: "{}".into(),
            status: "published".into(),
            language: "fr".into(),
            group_id: Uuid::new_v4(),
            version: 3,
            author_id: Some(4),
            published_at: Some(now),
            blocks: Some(serde_json::json!([{"type": "p"}])),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let snapshot = ContentVersion {
            id: 100,
            content_id: 9,
            version: 1,
            title: "Good".into(),
            body: "fine".into(),
            content_type: "page".into(),
            attributes: r#"{"a":1}"#.into(),
            status: "draft".into(),
            language: "en".into(),
            blocks: None,
            change_kind: "update".into(),
            reverted_to: None,
            changed_at: now,
        };

        let restored = restore(&current, &snapshot);
        assert_eq!(restored.id, 9);
        assert_eq!(restored.slug, "post");
        assert_eq!(restored.version, 3);
        assert_eq!(restored.title, "Good");
        assert_eq!(restored.content_type, "page");
        assert_eq!(restored.status, "draft");
        assert_eq!(restored.language, "en");
        assert_eq!(restored.blocks, None);
        assert_eq!(restored.published_at, current.published_at);
    }
}
