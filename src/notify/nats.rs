//! Event bus channel: publishes the structured event to NATS.

use async_trait::async_trait;

use super::{Notification, NotificationChannel, NotifyError};
use crate::config::NatsConfig;

pub struct NatsChannel {
    client: async_nats::Client,
    subject: String,
}

impl NatsChannel {
    pub async fn connect(config: &NatsConfig) -> Result<Self, NotifyError> {
        let client = async_nats::connect(config.url.as_str()).await.map_err(|e| NotifyError::Bus(e.to_string()))?;
        Ok(Self { client, subject: config.subject.clone() })
    }
}

/// `<base>.<event kind>`, e.g. `storefront.orders.placed`.
pub fn subject_for(base: &str, notification: &Notification) -> String {
    format!("{}.{}", base, notification.event.kind())
}

#[async_trait]
impl NotificationChannel for NatsChannel {
    fn name(&self) -> &'static str { "nats" }

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let payload = serde_json::to_vec(&notification.event)?;
        self.client
            .publish(subject_for(&self.subject, notification), payload.into())
            .await
            .map_err(|e| NotifyError::Bus(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::OrderStatus;
    use crate::domain::events::OrderEvent;
    use chrono::Utc;

    #[test]
    fn test_subject_carries_event_kind() {
        let n = Notification {
            message: String::new(),
            event: OrderEvent::StatusChanged { order_id: "1".into(), from: OrderStatus::Paid, to: OrderStatus::Delivered, at: Utc::now() },
        };
        assert_eq!(subject_for("storefront.orders", &n), "storefront.orders.status_changed");
    }
}
