//! Postgres store tests. Run with a database available:
//! `DATABASE_URL=postgres://... cargo test -p contentflow-db -- --ignored`

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use contentflow_db::models::content::{ContentFilter, NewContent};
use contentflow_db::models::content_version::NewContentVersion;
use contentflow_db::models::webhook::{CreateWebhook, UpdateWebhook};
use contentflow_db::store::{
    ContentStore, PgStore, StoreError, WebhookStore, UQ_CONTENTS_SLUG_LANGUAGE,
};
use sqlx::PgPool;
use uuid::Uuid;

fn new_content(slug: &str, language: &str) -> NewContent {
    NewContent {
        title: format!("Title {slug}"),
        slug: slug.to_string(),
        body: "body".to_string(),
        content_type: "blog".to_string(),
        attributes: "{}".to_string(),
        status: "draft".to_string(),
        language: language.to_string(),
        group_id: Uuid::new_v4(),
        author_id: None,
        published_at: None,
        blocks: None,
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn rollback_on_drop_discards_writes(pool: PgPool) {
    let store = PgStore::new(pool);
    let id = {
        let mut tx = store.begin().await.unwrap();
        let created = tx.insert_content(&new_content("gone", "en")).await.unwrap();
        created.id
    };
    assert!(store.find_content(id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn snapshot_and_save_commit_together(pool: PgPool) {
    let store = PgStore::new(pool);

    let mut tx = store.begin().await.unwrap();
    let created = tx.insert_content(&new_content("kept", "en")).await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = store.begin().await.unwrap();
    let mut locked = tx.lock_content(created.id).await.unwrap().unwrap();
    tx.insert_version(&NewContentVersion::before_update(&locked))
        .await
        .unwrap();
    locked.title = "Changed".into();
    locked.version += 1;
    tx.save_content(&locked).await.unwrap();
    tx.commit().await.unwrap();

    let live = store.find_content(created.id).await.unwrap().unwrap();
    assert_eq!(live.title, "Changed");
    assert_eq!(live.version, 2);

    let history = store.list_versions(created.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].version, 1);
    assert_eq!(history[0].title, "Title kept");
    assert_eq!(history[0].change_kind, "update");
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn duplicate_slug_maps_to_conflict(pool: PgPool) {
    let store = PgStore::new(pool);
    let mut tx = store.begin().await.unwrap();
    tx.insert_content(&new_content("dup", "en")).await.unwrap();
    let err = tx.insert_content(&new_content("dup", "en")).await.unwrap_err();
    assert_matches!(err, StoreError::Conflict(c) if c == UQ_CONTENTS_SLUG_LANGUAGE);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn scheduled_flip_is_conditional(pool: PgPool) {
    let store = PgStore::new(pool);
    let mut input = new_content("soon", "en");
    input.status = "scheduled".into();
    input.published_at = Some(Utc::now() - Duration::minutes(5));

    let mut tx = store.begin().await.unwrap();
    let created = tx.insert_content(&input).await.unwrap();
    tx.commit().await.unwrap();

    let now = Utc::now();
    let due = store.list_due_scheduled(now).await.unwrap();
    assert_eq!(due.len(), 1);

    let too_early = now - Duration::minutes(10);
    assert!(store.publish_scheduled(created.id, too_early).await.unwrap().is_none());

    let published = store.publish_scheduled(created.id, now).await.unwrap().unwrap();
    assert_eq!(published.status, "published");
    assert_eq!(published.version, 1);
    assert!(store.publish_scheduled(created.id, now).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn list_filters_by_tag_and_search(pool: PgPool) {
    let store = PgStore::new(pool);
    let mut tx = store.begin().await.unwrap();
    let rust = tx.insert_content(&new_content("rust-post", "en")).await.unwrap();
    tx.replace_tags(rust.id, &["rust".into()]).await.unwrap();
    tx.insert_content(&new_content("other-post", "en")).await.unwrap();
    tx.commit().await.unwrap();

    let page = store
        .list_content(&ContentFilter {
            tags: vec!["rust".into()],
            limit: 20,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, rust.id);

    let page = store
        .list_content(&ContentFilter {
            search: Some("TITLE".into()),
            limit: 20,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn webhook_update_is_partial(pool: PgPool) {
    let store = PgStore::new(pool);
    let hook = store
        .create_webhook(&CreateWebhook {
            url: "http://localhost/hook".into(),
            events: "content.update".into(),
            is_enabled: None,
        })
        .await
        .unwrap();
    assert!(hook.is_enabled);

    let updated = store
        .update_webhook(
            hook.id,
            &UpdateWebhook {
                is_enabled: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.url, hook.url);
    assert!(!updated.is_enabled);
    assert!(store.list_enabled_webhooks().await.unwrap().is_empty());
}
