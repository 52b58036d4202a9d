#![allow(dead_code)]

use std::sync::Arc;

use contentflow_content::ContentService;
use contentflow_db::models::content::{ContentChanges, CreateContent};
use contentflow_db::store::MemoryStore;
use contentflow_events::{EventBus, PlatformEvent};
use tokio::sync::broadcast;

/// A service over an in-memory store, with a subscriber attached to its bus.
pub struct Harness {
    pub store: MemoryStore,
    pub bus: Arc<EventBus>,
    pub service: Arc<ContentService>,
    pub events: broadcast::Receiver<PlatformEvent>,
}

pub fn harness() -> Harness {
    let store = MemoryStore::new();
    let bus = Arc::new(EventBus::default());
    let events = bus.subscribe();
    let service = Arc::new(ContentService::new(Arc::new(store.clone()), bus.clone()));
    Harness {
        store,
        bus,
        service,
        events,
    }
}

/// A valid draft blog post.
pub fn draft(slug: &str) -> CreateContent {
    CreateContent {
        title: format!("Post {slug}"),
        slug: slug.to_string(),
        body: format!("Body of {slug}"),
        content_type: "blog".to_string(),
        attributes: "{}".to_string(),
        status: "draft".to_string(),
        ..Default::default()
    }
}

pub fn retitle(title: &str) -> ContentChanges {
    ContentChanges {
        title: Some(title.to_string()),
        ..Default::default()
    }
}

/// Event names published so far that the receiver has not consumed.
pub fn drain(events: &mut broadcast::Receiver<PlatformEvent>) -> Vec<String> {
    let mut names = Vec::new();
    while let Ok(event) = events.try_recv() {
        names.push(event.event_type);
    }
    names
}
