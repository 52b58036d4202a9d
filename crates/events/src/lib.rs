//! ContentFlow event bus and webhook notification infrastructure.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`]: the domain event envelope published by the content
//!   engine and the scheduler.
//! - [`delivery`]: the [`WebhookSender`] seam and its HTTP implementation.
//! - [`WebhookDispatcher`]: background consumer that fans events out to
//!   matching webhooks through a bounded delivery pool.

pub mod bus;
pub mod delivery;
pub mod dispatcher;

pub use bus::{EntityRef, EventBus, PlatformEvent};
pub use delivery::webhook::{WebhookBody, WebhookDelivery, WebhookError, WebhookSender};
pub use dispatcher::WebhookDispatcher;
