//! In-process event bus.
//!
//! Content mutations and the scheduler publish [`PlatformEvent`]s here; the
//! webhook dispatcher is the main subscriber. Publishing never waits for
//! subscribers, so a slow consumer can only lose events, never stall a
//! request.

use chrono::{DateTime, Utc};
use contentflow_core::event_names::ENTITY_CONTENT;
use contentflow_core::types::DbId;
use contentflow_db::models::content::Content;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Events buffered per subscriber before the oldest are dropped.
const DEFAULT_CAPACITY: usize = 1024;

/// The record an event is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: String,
    pub id: DbId,
}

/// A state change that subscribers (webhooks, tests) may react to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformEvent {
    /// Dot-separated event name, e.g. `content.update`.
    pub event_type: String,
    pub entity: Option<EntityRef>,
    /// Event data; for content events, the content record as served by the API.
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl PlatformEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            entity: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Build a content event whose payload is the serialized record.
    pub fn for_content(
        event_type: impl Into<String>,
        content: &Content,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(event_type)
            .about(ENTITY_CONTENT, content.id)
            .with_payload(serde_json::to_value(content)?))
    }

    pub fn about(mut self, kind: impl Into<String>, id: DbId) -> Self {
        self.entity = Some(EntityRef {
            kind: kind.into(),
            id,
        });
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Id of the entity the event is about, if any.
    pub fn entity_id(&self) -> Option<DbId> {
        self.entity.as_ref().map(|e| e.id)
    }

    pub fn unix_timestamp(&self) -> i64 {
        self.timestamp.timestamp()
    }
}

/// Fan-out hub shared as `Arc<EventBus>`.
///
/// A subscriber that falls more than the channel capacity behind observes
/// `RecvError::Lagged` and misses the overwritten events.
pub struct EventBus {
    sender: broadcast::Sender<PlatformEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to every current subscriber and return how many there were.
    /// With no subscribers the event is dropped.
    pub fn publish(&self, event: PlatformEvent) -> usize {
        let event_type = event.event_type.clone();
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                tracing::trace!(event_type = %event_type, "No subscribers, event dropped");
                0
            }
        }
    }

    /// Receive every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
