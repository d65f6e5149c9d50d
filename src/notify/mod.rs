//! Order notification fan-out.
//!
//! Every configured channel receives the same rendered message plus the
//! structured event. Channels run as independent tasks; a failure (or panic)
//! in one never reaches the others or the request that triggered it.

use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use thiserror::Error;

use crate::config::NotificationConfig;
use crate::domain::events::OrderEvent;

pub mod email;
pub mod message;
pub mod messenger;
pub mod nats;
pub mod telegram;
pub mod webhook;

pub use message::ShopAccount;

#[derive(Clone, Debug)]
pub struct Notification {
    pub message: String,
    pub event: OrderEvent,
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Email error: {0}")]
    Email(String),

    #[error("Event bus error: {0}")]
    Bus(String),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl NotifyError {
    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Self::Rejected { status, body }
    }
}

#[async_trait]
pub trait NotificationChannel: Send + Sync {
    fn name(&self) -> &'static str;
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Channel names by outcome, for logging and tests only.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: Vec<&'static str>,
    pub failed: Vec<&'static str>,
}

#[derive(Clone, Default)]
pub struct Notifier {
    channels: Vec<Arc<dyn NotificationChannel>>,
    shop: ShopAccount,
}

impl Notifier {
    pub fn new(shop: ShopAccount) -> Self { Self { channels: Vec::new(), shop } }

    pub fn with_channel(mut self, channel: Arc<dyn NotificationChannel>) -> Self {
        self.channels.push(channel);
        self
    }

    pub async fn from_config(config: &NotificationConfig, shop: ShopAccount) -> Self {
        let http = reqwest::Client::new();
        let mut notifier = Self::new(shop);
        if let Some(c) = &config.messenger {
            notifier = notifier.with_channel(Arc::new(messenger::MessengerChannel::new(http.clone(), c.clone())));
        }
        if let Some(c) = &config.telegram {
            notifier = notifier.with_channel(Arc::new(telegram::TelegramChannel::new(http.clone(), c.clone())));
        }
        if let Some(c) = &config.email {
            match email::EmailChannel::new(c) {
                Ok(ch) => notifier = notifier.with_channel(Arc::new(ch)),
                Err(e) => tracing::warn!(error = %e, "email channel disabled"),
            }
        }
        if let Some(url) = &config.webhook_url {
            notifier = notifier.with_channel(Arc::new(webhook::WebhookChannel::new(http.clone(), url.clone())));
        }
        if let Some(c) = &config.nats {
            match nats::NatsChannel::connect(c).await {
                Ok(ch) => notifier = notifier.with_channel(Arc::new(ch)),
                Err(e) => tracing::warn!(error = %e, url = %c.url, "NATS channel disabled"),
            }
        }
        tracing::info!(channels = ?notifier.channel_names(), "notification channels ready");
        notifier
    }

    pub fn channel_names(&self) -> Vec<&'static str> { self.channels.iter().map(|c| c.name()).collect() }

    pub fn render(&self, event: OrderEvent) -> Notification {
        Notification { message: message::render(&event, &self.shop), event }
    }

    /// Sends to every channel concurrently and waits for all of them to settle.
    pub async fn dispatch(&self, notification: Notification) -> DispatchReport {
        let notification = Arc::new(notification);
        let tasks = self.channels.iter().map(|channel| {
            let channel = Arc::clone(channel);
            let notification = Arc::clone(&notification);
            let name = channel.name();
            (name, tokio::spawn(async move { channel.send(&notification).await }))
        });
        let (names, handles): (Vec<_>, Vec<_>) = tasks.unzip();
        let outcomes = join_all(handles).await;

        let order_id = notification.event.order_id();
        let mut report = DispatchReport::default();
        for (name, outcome) in names.into_iter().zip(outcomes) {
            match outcome {
                Ok(Ok(())) => {
                    tracing::debug!(channel = name, order_id, "notification delivered");
                    report.delivered.push(name);
                }
                Ok(Err(e)) => {
                    tracing::warn!(channel = name, order_id, error = %e, "notification failed");
                    report.failed.push(name);
                }
                Err(e) => {
                    tracing::error!(channel = name, order_id, error = %e, "notification task aborted");
                    report.failed.push(name);
                }
            }
        }
        report
    }

    /// Renders and dispatches, logging the outcome.
    pub async fn publish(&self, event: OrderEvent) -> DispatchReport {
        let kind = event.kind();
        let report = self.dispatch(self.render(event)).await;
        tracing::info!(event = kind, delivered = report.delivered.len(), failed = report.failed.len(), "notifications settled");
        report
    }
}

/// Channel that keeps what it receives. Used by tests across the crate.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use tokio::sync::Mutex;

    #[derive(Default)]
    pub struct RecordingChannel {
        pub received: Mutex<Vec<Notification>>,
        pub fail: bool,
    }

    impl RecordingChannel {
        pub fn failing() -> Self { Self { received: Mutex::default(), fail: true } }
    }

    #[async_trait]
    impl NotificationChannel for RecordingChannel {
        fn name(&self) -> &'static str { if self.fail { "failing" } else { "recording" } }

        async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
            self.received.lock().await.push(notification.clone());
            if self.fail { return Err(NotifyError::Rejected { status: 500, body: "down".into() }); }
            Ok(())
        }
    }
}
