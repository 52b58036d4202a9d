//! Webhook fan-out.
//!
//! [`WebhookDispatcher`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and, for every event, delivers it to each enabled webhook whose filter
//! matches. Every delivery runs on its own task; a semaphore caps how many
//! run at once. Failures are logged and dropped.

use std::sync::Arc;

use contentflow_core::webhook::webhook_matches_event;
use contentflow_db::store::{StoreError, WebhookStore};
use tokio::sync::{broadcast, Semaphore};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::bus::PlatformEvent;
use crate::delivery::webhook::WebhookSender;

/// Default cap on in-flight deliveries.
pub const DEFAULT_MAX_CONCURRENCY: usize = 16;

/// Background service that delivers bus events to registered webhooks.
pub struct WebhookDispatcher {
    webhooks: Arc<dyn WebhookStore>,
    sender: Arc<dyn WebhookSender>,
    permits: Arc<Semaphore>,
    tracker: TaskTracker,
}

impl WebhookDispatcher {
    pub fn new(
        webhooks: Arc<dyn WebhookStore>,
        sender: Arc<dyn WebhookSender>,
        max_concurrency: usize,
    ) -> Self {
        Self {
            webhooks,
            sender,
            permits: Arc::new(Semaphore::new(max_concurrency.max(1))),
            tracker: TaskTracker::new(),
        }
    }

    /// Run the dispatch loop.
    ///
    /// Exits when `cancel` fires or the bus is dropped, then waits for
    /// in-flight deliveries to finish.
    pub async fn run(
        &self,
        mut receiver: broadcast::Receiver<PlatformEvent>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Webhook dispatcher cancelled");
                    break;
                }
                received = receiver.recv() => match received {
                    Ok(event) => {
                        if let Err(e) = self.dispatch(event).await {
                            tracing::error!(error = %e, "Failed to load webhooks for dispatch");
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(
                            skipped = n,
                            "Webhook dispatcher lagged, some events were not delivered"
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Event bus closed, webhook dispatcher shutting down");
                        break;
                    }
                },
            }
        }

        self.tracker.close();
        self.tracker.wait().await;
    }

    /// Spawn one delivery per enabled webhook whose filter matches `event`.
    ///
    /// Waits for a free delivery slot before each spawn, so a burst of events
    /// cannot queue unbounded tasks. Returns the number of deliveries started.
    pub async fn dispatch(&self, event: PlatformEvent) -> Result<usize, StoreError> {
        let targets: Vec<String> = self
            .webhooks
            .list_enabled_webhooks()
            .await?
            .into_iter()
            .filter(|hook| webhook_matches_event(&hook.events, &event.event_type))
            .map(|hook| hook.url)
            .collect();

        if targets.is_empty() {
            return Ok(0);
        }

        let event = Arc::new(event);
        let mut started = 0;
        for url in targets {
            let Ok(permit) = Arc::clone(&self.permits).acquire_owned().await else {
                break;
            };
            let sender = Arc::clone(&self.sender);
            let event = Arc::clone(&event);
            self.tracker.spawn(async move {
                let _permit = permit;
                match sender.send(&url, &event).await {
                    Ok(()) => {
                        tracing::debug!(url = %url, event_type = %event.event_type, "Webhook delivered");
                    }
                    Err(e) => {
                        tracing::error!(
                            url = %url,
                            event_type = %event.event_type,
                            error = %e,
                            "Webhook delivery failed"
                        );
                    }
                }
            });
            started += 1;
        }

        Ok(started)
    }
}
