//! Generic JSON webhook channel.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use super::{Notification, NotificationChannel, NotifyError};

pub struct WebhookChannel {
    client: reqwest::Client,
    url: String,
}

impl WebhookChannel {
    pub fn new(client: reqwest::Client, url: String) -> Self { Self { client, url } }
}

fn payload(notification: &Notification, sent_at: DateTime<Utc>) -> Value {
    json!({
        "message": notification.message,
        "orderData": notification.event,
        "timestamp": sent_at.to_rfc3339(),
    })
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    fn name(&self) -> &'static str { "webhook" }

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let response = self.client.post(&self.url).json(&payload(notification, Utc::now())).send().await?;
        if !response.status().is_success() {
            return Err(NotifyError::from_response(response).await);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::OrderEvent;
    use chrono::TimeZone;

    #[test]
    fn test_payload_carries_message_event_and_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 3, 30, 0).unwrap();
        let notification = Notification {
            message: "✅ *PAYMENT CONFIRMED*".into(),
            event: OrderEvent::PaymentConfirmed { order_id: "123456789012".into(), customer_name: "Mai".into(), total_price: 90_000, paid_at: at },
        };
        let body = payload(&notification, at);
        assert_eq!(body["message"], "✅ *PAYMENT CONFIRMED*");
        assert_eq!(body["orderData"], serde_json::to_value(&notification.event).unwrap());
        assert_eq!(body["timestamp"], "2024-06-01T03:30:00+00:00");
    }
}
