//! Webhook delivery.
//!
//! [`WebhookDelivery`] POSTs an event to an external URL as
//! `{"event", "timestamp", "data"}`. Delivery is at-most-once: a failed
//! attempt is reported to the caller and never retried.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::bus::PlatformEvent;

/// Default HTTP request timeout for a single delivery.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// `User-Agent` sent with every delivery.
pub const WEBHOOK_USER_AGENT: &str = "ContentFlow-CMS-Webhook";

/// Why a delivery attempt failed.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// Connection, DNS, TLS or timeout failure.
    #[error("webhook request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("webhook endpoint answered HTTP {0}")]
    HttpStatus(u16),
}

/// Sends one event to one webhook endpoint.
#[async_trait]
pub trait WebhookSender: Send + Sync {
    async fn send(&self, url: &str, event: &PlatformEvent) -> Result<(), WebhookError>;
}

/// Wire format of a delivery.
#[derive(Debug, Serialize)]
pub struct WebhookBody<'a> {
    pub event: &'a str,
    /// Unix seconds.
    pub timestamp: i64,
    pub data: &'a serde_json::Value,
}

impl<'a> From<&'a PlatformEvent> for WebhookBody<'a> {
    fn from(event: &'a PlatformEvent) -> Self {
        Self {
            event: &event.event_type,
            timestamp: event.unix_timestamp(),
            data: &event.payload,
        }
    }
}

/// HTTP implementation of [`WebhookSender`] over a shared reqwest client.
pub struct WebhookDelivery {
    client: reqwest::Client,
}

impl WebhookDelivery {
    pub fn new(timeout: Duration) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(WEBHOOK_USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl WebhookSender for WebhookDelivery {
    async fn send(&self, url: &str, event: &PlatformEvent) -> Result<(), WebhookError> {
        let status = self
            .client
            .post(url)
            .json(&WebhookBody::from(event))
            .send()
            .await?
            .status();
        if status.is_success() {
            Ok(())
        } else {
            Err(WebhookError::HttpStatus(status.as_u16()))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
