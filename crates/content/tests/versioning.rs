mod common;

use assert_matches::assert_matches;
use common::{draft, drain, harness, retitle};
use contentflow_content::ContentError;
use contentflow_core::error::CoreError;
use contentflow_db::models::content::{ContentChanges, ContentFilter, CreateContent};
use contentflow_db::store::StoreError;

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_starts_at_version_one_and_notifies() {
    let mut h = harness();
    let content = h.service.create(draft("hello-world"), Some(5)).await.unwrap();

    assert_eq!(content.version, 1);
    assert_eq!(content.language, "en");
    assert_eq!(content.status, "draft");
    assert_eq!(content.author_id, Some(5));

    let event = h.events.try_recv().unwrap();
    assert_eq!(event.event_type, "content.create");
    assert_eq!(event.entity_id(), Some(content.id));
    assert_eq!(event.payload["slug"], "hello-world");
    assert_eq!(event.payload["type"], "blog");
    assert!(event.payload.get("deleted_at").is_none());
}

#[tokio::test]
async fn create_attaches_categories_and_tags() {
    let h = harness();
    let news = h.store.insert_category("News", "news").await;
    let input = CreateContent {
        category_ids: vec![news.id],
        tags: vec!["rust".into(), " cms ".into(), "rust".into()],
        ..draft("tagged-post")
    };
    let content = h.service.create(input, None).await.unwrap();

    let detail = h.service.get(content.id).await.unwrap();
    assert_eq!(detail.categories, vec![news]);
    let tags: Vec<_> = detail.tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(tags, vec!["cms", "rust"]);
}

#[tokio::test]
async fn duplicate_slug_in_same_language_conflicts() {
    let mut h = harness();
    h.service.create(draft("taken"), None).await.unwrap();
    drain(&mut h.events);

    let err = h.service.create(draft("taken"), None).await.unwrap_err();
    assert_matches!(err, ContentError::Store(StoreError::Conflict(_)));
    assert!(drain(&mut h.events).is_empty());

    let french = CreateContent {
        language: Some("fr".into()),
        ..draft("taken")
    };
    h.service.create(french, None).await.unwrap();
}

#[tokio::test]
async fn invalid_input_is_rejected_before_writing() {
    let h = harness();
    let bad_status = CreateContent {
        status: "archived".into(),
        ..draft("bad-status")
    };
    let err = h.service.create(bad_status, None).await.unwrap_err();
    assert_matches!(err, ContentError::Core(CoreError::Validation(_)));

    let bad_slug = draft("Not A Slug");
    let err = h.service.create(bad_slug, None).await.unwrap_err();
    assert_matches!(err, ContentError::Core(CoreError::Validation(_)));

    let page = h.service.list(ContentFilter::default()).await.unwrap();
    assert_eq!(page.total, 0);
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

#[tokio::test]
async fn repeated_updates_increment_version_with_one_snapshot_each() {
    let h = harness();
    let content = h.service.create(draft("counter"), None).await.unwrap();

    for n in 2..=5 {
        let updated = h
            .service
            .update(content.id, retitle(&format!("Revision {n}")))
            .await
            .unwrap();
        assert_eq!(updated.version, n);
    }

    let history = h.service.history(content.id).await.unwrap();
    let versions: Vec<i32> = history.iter().map(|v| v.version).collect();
    assert_eq!(versions, vec![4, 3, 2, 1]);
    assert!(history.iter().all(|v| v.change_kind == "update"));
}

#[tokio::test]
async fn snapshot_holds_the_pre_update_state() {
    let mut h = harness();
    let content = h
        .service
        .create(
            CreateContent {
                title: "Title A".into(),
                ..draft("fidelity")
            },
            None,
        )
        .await
        .unwrap();
    drain(&mut h.events);

    let updated = h.service.update(content.id, retitle("Title B")).await.unwrap();
    assert_eq!(updated.title, "Title B");
    assert_eq!(updated.version, 2);

    let history = h.service.history(content.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].version, 1);
    assert_eq!(history[0].title, "Title A");
    assert_eq!(history[0].body, content.body);

    assert_eq!(drain(&mut h.events), vec!["content.update"]);
}

#[tokio::test]
async fn partial_update_keeps_untouched_fields() {
    let h = harness();
    let created = h
        .service
        .create(
            CreateContent {
                tags: vec!["keep".into()],
                ..draft("partial")
            },
            None,
        )
        .await
        .unwrap();

    let changes = ContentChanges {
        body: Some("New body".into()),
        title: Some(String::new()),
        status: Some("Published".into()),
        tags: Some(vec![]),
        ..Default::default()
    };
    let updated = h.service.update(created.id, changes).await.unwrap();

    assert_eq!(updated.title, created.title);
    assert_eq!(updated.body, "New body");
    assert_eq!(updated.status, "published");
    assert_eq!(updated.slug, created.slug);
    assert_eq!(updated.group_id, created.group_id);

    let detail = h.service.get(created.id).await.unwrap();
    assert_eq!(detail.tags.len(), 1);
    assert_eq!(detail.tags[0].name, "keep");
}

#[tokio::test]
async fn update_of_missing_content_is_not_found() {
    let mut h = harness();
    let err = h.service.update(404, retitle("Nothing")).await.unwrap_err();
    assert_matches!(err, ContentError::Core(CoreError::NotFound { id: 404, .. }));
    assert!(drain(&mut h.events).is_empty());
    assert_eq!(h.store.version_count().await, 0);
}

#[tokio::test]
async fn failed_update_leaves_no_trace() {
    let mut h = harness();
    let content = h.service.create(draft("fragile"), None).await.unwrap();
    drain(&mut h.events);

    h.store.fail_writes_for(content.id).await;
    let err = h.service.update(content.id, retitle("Never")).await.unwrap_err();
    assert_matches!(err, ContentError::Store(StoreError::Database(_)));

    h.store.clear_failures().await;
    let live = h.service.get(content.id).await.unwrap().content;
    assert_eq!(live.version, 1);
    assert_eq!(live.title, content.title);
    assert!(h.service.history(content.id).await.unwrap().is_empty());
    assert!(drain(&mut h.events).is_empty());
}

#[tokio::test]
async fn language_change_into_taken_translation_conflicts() {
    let h = harness();
    let english = h.service.create(draft("greeting"), None).await.unwrap();
    h.service
        .add_translation(
            english.id,
            CreateContent {
                language: Some("de".into()),
                ..draft("gruss")
            },
        )
        .await
        .unwrap();

    let changes = ContentChanges {
        language: Some("de".into()),
        ..Default::default()
    };
    let err = h.service.update(english.id, changes).await.unwrap_err();
    assert_matches!(err, ContentError::Store(StoreError::Conflict(_)));
    assert!(h.service.history(english.id).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_updates_are_serialised() {
    let h = harness();
    let id = h.service.create(draft("contended"), None).await.unwrap().id;

    let a = {
        let service = h.service.clone();
        tokio::spawn(async move { service.update(id, retitle("Writer A")).await })
    };
    let b = {
        let service = h.service.clone();
        tokio::spawn(async move { service.update(id, retitle("Writer B")).await })
    };
    let (a, b) = futures::join!(a, b);
    let (a, b) = (a.unwrap().unwrap(), b.unwrap().unwrap());

    let mut versions = [a.version, b.version];
    versions.sort();
    assert_eq!(versions, [2, 3]);

    let live = h.service.get(id).await.unwrap().content;
    assert_eq!(live.version, 3);

    let history = h.service.history(id).await.unwrap();
    let snapshot_versions: Vec<i32> = history.iter().map(|v| v.version).collect();
    assert_eq!(snapshot_versions, vec![2, 1]);
    assert_ne!(history[0].id, history[1].id);
}

// ---------------------------------------------------------------------------
// Translations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn translation_joins_the_original_group() {
    let mut h = harness();
    let original = h.service.create(draft("welcome"), None).await.unwrap();
    h.service.update(original.id, retitle("Welcome back")).await.unwrap();
    drain(&mut h.events);

    let translation = h
        .service
        .add_translation(
            original.id,
            CreateContent {
                language: Some("fr".into()),
                ..draft("bienvenue")
            },
        )
        .await
        .unwrap();

    assert_eq!(translation.group_id, original.group_id);
    assert_eq!(translation.language, "fr");
    assert_eq!(translation.version, 1);
    assert_eq!(drain(&mut h.events), vec!["content.create"]);
}

#[tokio::test]
async fn second_translation_in_same_language_conflicts() {
    let h = harness();
    let original = h.service.create(draft("intro"), None).await.unwrap();
    let spanish = || CreateContent {
        language: Some("es".into()),
        ..draft("introduccion")
    };
    h.service.add_translation(original.id, spanish()).await.unwrap();

    let err = h
        .service
        .add_translation(original.id, spanish())
        .await
        .unwrap_err();
    assert_matches!(err, ContentError::Core(CoreError::Conflict(_)));

    let err = h
        .service
        .add_translation(
            original.id,
            CreateContent {
                language: Some("en".into()),
                ..draft("intro-again")
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ContentError::Core(CoreError::Conflict(_)));
}

#[tokio::test]
async fn translation_requires_existing_original_and_language() {
    let h = harness();
    let err = h
        .service
        .add_translation(
            77,
            CreateContent {
                language: Some("it".into()),
                ..draft("ciao")
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ContentError::Core(CoreError::NotFound { id: 77, .. }));

    let original = h.service.create(draft("hello"), None).await.unwrap();
    let err = h
        .service
        .add_translation(original.id, draft("no-language"))
        .await
        .unwrap_err();
    assert_matches!(err, ContentError::Core(CoreError::Validation(_)));
}

// ---------------------------------------------------------------------------
// Reads and delete
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_filters_and_paginates() {
    let h = harness();
    h.service
        .create(
            CreateContent {
                tags: vec!["rust".into()],
                ..draft("rust-news")
            },
            None,
        )
        .await
        .unwrap();
    h.service
        .create(
            CreateContent {
                content_type: "page".into(),
                status: "published".into(),
                ..draft("about-us")
            },
            None,
        )
        .await
        .unwrap();
    h.service
        .create(
            CreateContent {
                body: "All about RUST tooling".into(),
                language: Some("fr".into()),
                ..draft("outils")
            },
            None,
        )
        .await
        .unwrap();

    let all = h.service.list(ContentFilter::default()).await.unwrap();
    assert_eq!(all.total, 3);
    assert_eq!(all.items.len(), 1, "limit is clamped to at least one");

    let by_tag = h
        .service
        .list(ContentFilter {
            tags: vec!["rust".into(), "missing".into()],
            limit: 20,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_tag.total, 1);
    assert_eq!(by_tag.items[0].slug, "rust-news");

    let search = h
        .service
        .list(ContentFilter {
            search: Some("rust".into()),
            limit: 20,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(search.total, 2);

    let pages = h
        .service
        .list(ContentFilter {
            content_type: Some("page".into()),
            status: Some("published".into()),
            limit: 20,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(pages.total, 1);
    assert_eq!(pages.items[0].slug, "about-us");

    let french = h
        .service
        .list(ContentFilter {
            language: Some("fr".into()),
            limit: 20,
            offset: 1,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(french.total, 1);
    assert!(french.items.is_empty());
}

#[tokio::test]
async fn delete_hides_content_and_notifies() {
    let mut h = harness();
    let content = h.service.create(draft("short-lived"), None).await.unwrap();
    h.service.update(content.id, retitle("Still here")).await.unwrap();
    drain(&mut h.events);

    h.service.delete(content.id).await.unwrap();
    assert_eq!(drain(&mut h.events), vec!["content.delete"]);

    let err = h.service.get(content.id).await.unwrap_err();
    assert_matches!(err, ContentError::Core(CoreError::NotFound { .. }));
    let err = h.service.history(content.id).await.unwrap_err();
    assert_matches!(err, ContentError::Core(CoreError::NotFound { .. }));
    let err = h.service.delete(content.id).await.unwrap_err();
    assert_matches!(err, ContentError::Core(CoreError::NotFound { .. }));

    // The slug is free again once the old record is deleted.
    h.service.create(draft("short-lived"), None).await.unwrap();
}
