//! Delivery channels.
//!
//! [`LogChannel`] stands in for push, email, and SMS gateways that live
//! outside this service: it writes a structured log line per delivery.
//! [`WebhookChannel`] POSTs the notification as JSON to a URL.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use super::Notification;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// Worth retrying: connection refused, timeout, 5xx.
    #[error("transient delivery failure: {0}")]
    Transient(String),
    /// Retrying will not help: 4xx, malformed request.
    #[error("permanent delivery failure: {0}")]
    Permanent(String),
}

#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Channel name used in logs, metrics, and `sent_via`.
    fn name(&self) -> &str;

    async fn deliver(&self, notification: &Notification) -> Result<(), ChannelError>;
}

/// Kinds of log-backed channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Push,
    Email,
    Sms,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Email => "email",
            Self::Sms => "sms",
        }
    }
}

impl std::str::FromStr for ChannelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "push" => Ok(Self::Push),
            "email" => Ok(Self::Email),
            "sms" => Ok(Self::Sms),
            other => Err(format!("unknown notification channel {other:?}")),
        }
    }
}

/// Writes each delivery to the tracing log.
#[derive(Debug, Clone)]
pub struct LogChannel {
    kind: ChannelKind,
}

impl LogChannel {
    pub fn new(kind: ChannelKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl NotificationChannel for LogChannel {
    fn name(&self) -> &str {
        self.kind.as_str()
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), ChannelError> {
        tracing::info!(
            channel = self.kind.as_str(),
            notification_id = %notification.id,
            target = %notification.target,
            priority = %notification.priority,
            work_order_id = %notification.reference.work_order_id,
            title = %notification.title,
            "notification delivered"
        );
        Ok(())
    }
}

/// POSTs notifications as JSON to a webhook.
#[derive(Debug, Clone)]
pub struct WebhookChannel {
    client: reqwest::Client,
    url: String,
}

impl WebhookChannel {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), ChannelError> {
        let resp = self
            .client
            .post(&self.url)
            .json(notification)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Err(ChannelError::Transient(format!("webhook returned {status}")))
        } else {
            Err(ChannelError::Permanent(format!("webhook returned {status}")))
        }
    }
}

fn classify_transport_error(e: reqwest::Error) -> ChannelError {
    if e.is_builder() {
        ChannelError::Permanent(e.to_string())
    } else {
        ChannelError::Transient(e.to_string())
    }
}
