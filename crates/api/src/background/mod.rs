//! Long-running background services.
//!
//! [`BackgroundServices`] spawns the scheduled publisher and the webhook
//! dispatcher on a shared [`CancellationToken`] and stops both on shutdown.

use std::sync::Arc;
use std::time::Duration;

use contentflow_content::ScheduledPublisher;
use contentflow_core::clock::SystemClock;
use contentflow_db::store::{ContentStore, WebhookStore};
use contentflow_events::{EventBus, WebhookDelivery, WebhookDispatcher, WebhookError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;

/// Handles to the spawned background tasks.
pub struct BackgroundServices {
    cancel: CancellationToken,
    scheduler: JoinHandle<()>,
    dispatcher: JoinHandle<()>,
}

impl BackgroundServices {
    /// Spawn the scheduler and the dispatcher.
    ///
    /// The dispatcher subscribes to `event_bus` before this returns, so no
    /// event published afterwards is missed.
    pub fn start<S>(
        store: Arc<S>,
        event_bus: &Arc<EventBus>,
        config: &ServerConfig,
    ) -> Result<Self, WebhookError>
    where
        S: ContentStore + WebhookStore + 'static,
    {
        let cancel = CancellationToken::new();

        let publisher = ScheduledPublisher::new(
            store.clone(),
            Arc::clone(event_bus),
            Arc::new(SystemClock),
            Duration::from_secs(config.scheduler_interval_secs),
        );
        let scheduler = tokio::spawn({
            let cancel = cancel.clone();
            async move { publisher.run(cancel).await }
        });

        let delivery = WebhookDelivery::new(Duration::from_secs(config.webhook_timeout_secs))?;
        let dispatcher =
            WebhookDispatcher::new(store, Arc::new(delivery), config.webhook_max_concurrency);
        let receiver = event_bus.subscribe();
        let dispatcher = tokio::spawn({
            let cancel = cancel.clone();
            async move { dispatcher.run(receiver, cancel).await }
        });

        tracing::info!(
            scheduler_interval_secs = config.scheduler_interval_secs,
            webhook_max_concurrency = config.webhook_max_concurrency,
            "Background services started"
        );

        Ok(Self {
            cancel,
            scheduler,
            dispatcher,
        })
    }

    /// Cancel both services and wait up to `timeout` for each to finish.
    pub async fn shutdown(self, timeout: Duration) {
        self.cancel.cancel();

        if tokio::time::timeout(timeout, self.scheduler).await.is_err() {
            tracing::warn!("Scheduled publisher did not stop in time");
        }
        if tokio::time::timeout(timeout, self.dispatcher).await.is_err() {
            tracing::warn!("Webhook dispatcher did not stop in time");
        }
        tracing::info!("Background services stopped");
    }
}
