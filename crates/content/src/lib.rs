//! Content lifecycle for the ContentFlow backend.
//!
//! [`ContentService`] owns every mutation of a content record. Each mutation
//! runs inside one store transaction and, once committed, publishes a
//! [`PlatformEvent`](contentflow_events::PlatformEvent) on the bus:
//!
//! - [`versioning`]: create, translate, update (snapshot + increment), delete
//!   and the read paths.
//! - [`revert`]: restore an earlier snapshot as a new forward version.
//! - [`scheduler`]: periodic promotion of scheduled content to published.

use std::sync::Arc;

use contentflow_core::error::CoreError;
use contentflow_core::event_names::ENTITY_CONTENT;
use contentflow_core::types::DbId;
use contentflow_db::models::content::Content;
use contentflow_db::store::{ContentStore, StoreError};
use contentflow_events::{EventBus, PlatformEvent};

pub mod revert;
pub mod scheduler;
pub mod versioning;

pub use scheduler::{ScheduledPublisher, SweepReport};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for content operations.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The requested snapshot does not exist for this content.
    #[error("Version {version} not found for content {content_id}")]
    VersionNotFound { content_id: DbId, version: i32 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub(crate) fn content_not_found(id: DbId) -> ContentError {
    ContentError::Core(CoreError::NotFound {
        entity: ENTITY_CONTENT,
        id,
    })
}

// ---------------------------------------------------------------------------
// ContentService
// ---------------------------------------------------------------------------

/// Entry point for reading and mutating content.
pub struct ContentService {
    store: Arc<dyn ContentStore>,
    events: Arc<EventBus>,
}

impl ContentService {
    pub fn new(store: Arc<dyn ContentStore>, events: Arc<EventBus>) -> Self {
        Self { store, events }
    }

    fn notify(&self, event_type: &str, content: &Content) {
        publish_content_event(&self.events, event_type, content);
    }
}

/// Publish `event_type` with `content` as payload. Never blocks or fails.
pub(crate) fn publish_content_event(bus: &EventBus, event_type: &str, content: &Content) {
    match PlatformEvent::for_content(event_type, content) {
        Ok(event) => {
            bus.publish(event);
        }
        Err(e) => {
            tracing::error!(content_id = content.id, error = %e, "Failed to serialize event payload");
        }
    }
}
