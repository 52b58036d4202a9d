//! Scheduled publication.
//!
//! [`ScheduledPublisher`] runs as a background task, periodically promoting
//! content whose `published_at` has passed from `scheduled` to `published`
//! and announcing each promotion as `content.published`.

use std::sync::Arc;
use std::time::Duration;

use contentflow_core::clock::Clock;
use contentflow_core::event_names::CONTENT_PUBLISHED;
use contentflow_db::store::{ContentStore, StoreError};
use contentflow_events::EventBus;
use tokio_util::sync::CancellationToken;

use crate::publish_content_event;

/// Default time between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Records flipped to published by this sweep.
    pub published: usize,
    /// Records that were due at query time but were already published, or
    /// rescheduled, before their flip.
    pub skipped: usize,
    /// Records whose flip failed.
    pub failed: usize,
}

// ---------------------------------------------------------------------------
// ScheduledPublisher
// ---------------------------------------------------------------------------

/// Background service that publishes scheduled content once it is due.
pub struct ScheduledPublisher {
    store: Arc<dyn ContentStore>,
    events: Arc<EventBus>,
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl ScheduledPublisher {
    pub fn new(
        store: Arc<dyn ContentStore>,
        events: Arc<EventBus>,
        clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            events,
            clock,
            interval,
        }
    }

    /// Run the sweep loop.
    ///
    /// Sweeps immediately, then once per interval. The loop exits when the
    /// provided [`CancellationToken`] is cancelled.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Scheduled publisher cancelled");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.sweep().await {
                        tracing::error!(error = %e, "Failed to sweep scheduled content");
                    }
                }
            }
        }
    }

    /// Publish every record that is scheduled and due at the clock's "now".
    ///
    /// Each record is flipped with its own conditional update; one failure is
    /// logged and counted without stopping the rest. Only the initial query
    /// failing aborts the sweep.
    pub async fn sweep(&self) -> Result<SweepReport, StoreError> {
        let now = self.clock.now();
        let due = self.store.list_due_scheduled(now).await?;
        let mut report = SweepReport::default();

        for content in &due {
            match self.store.publish_scheduled(content.id, now).await {
                Ok(Some(published)) => {
                    report.published += 1;
                    tracing::info!(content_id = published.id, "Scheduled content published");
                    publish_content_event(&self.events, CONTENT_PUBLISHED, &published);
                }
                Ok(None) => {
                    report.skipped += 1;
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(
                        content_id = content.id,
                        error = %e,
                        "Failed to publish scheduled content"
                    );
                }
            }
        }

        if !due.is_empty() {
            tracing::info!(
                published = report.published,
                skipped = report.skipped,
                failed = report.failed,
                "Scheduled sweep finished"
            );
        }

        Ok(report)
    }
}
