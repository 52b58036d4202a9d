use std::sync::Arc;

use contentflow_content::ContentService;
use contentflow_db::store::{ContentStore, WebhookStore};
use contentflow_events::EventBus;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Content lifecycle: versioning, revert, translations.
    pub content: Arc<ContentService>,
    /// Backing store, used directly for health checks.
    pub store: Arc<dyn ContentStore>,
    /// Webhook registrations.
    pub webhooks: Arc<dyn WebhookStore>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Event bus the content service publishes to.
    pub event_bus: Arc<EventBus>,
}

impl AppState {
    /// Wire a store that serves both content and webhooks.
    pub fn new<S>(store: Arc<S>, config: ServerConfig, event_bus: Arc<EventBus>) -> Self
    where
        S: ContentStore + WebhookStore + 'static,
    {
        let content_store: Arc<dyn ContentStore> = store.clone();
        Self {
            content: Arc::new(ContentService::new(
                Arc::clone(&content_store),
                Arc::clone(&event_bus),
            )),
            store: content_store,
            webhooks: store,
            config: Arc::new(config),
            event_bus,
        }
    }
}
