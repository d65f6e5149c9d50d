//! Facebook Messenger channel.
//!
//! With a user access token the message goes through the Graph API. Without
//! one, or when the API refuses it, a `m.me` link carrying the message is
//! logged so the shop owner can send it by hand.

use async_trait::async_trait;
use serde_json::json;

use super::{Notification, NotificationChannel, NotifyError};
use crate::config::MessengerConfig;

const GRAPH_MESSAGES: &str = "https://graph.facebook.com/v18.0/me/messages";

pub struct MessengerChannel {
    client: reqwest::Client,
    config: MessengerConfig,
}

impl MessengerChannel {
    pub fn new(client: reqwest::Client, config: MessengerConfig) -> Self { Self { client, config } }

    pub fn manual_link(&self, message: &str) -> String {
        let base = format!("https://m.me/{}", self.config.page_id);
        reqwest::Url::parse_with_params(&base, &[("text", message)]).map(String::from).unwrap_or(base)
    }
}

#[async_trait]
impl NotificationChannel for MessengerChannel {
    fn name(&self) -> &'static str { "messenger" }

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let Some(token) = &self.config.access_token else {
            tracing::info!(link = %self.manual_link(&notification.message), "messenger link ready to send manually");
            return Ok(());
        };

        let body = json!({
            "recipient": { "id": self.config.page_id },
            "message": { "text": notification.message },
        });
        let response = self.client.post(GRAPH_MESSAGES).bearer_auth(token).json(&body).send().await?;
        if !response.status().is_success() {
            tracing::info!(link = %self.manual_link(&notification.message), "messenger fallback link");
            return Err(NotifyError::from_response(response).await);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_link_encodes_message() {
        let ch = MessengerChannel::new(reqwest::Client::new(), MessengerConfig { page_id: "flowercafe".into(), access_token: None });
        assert_eq!(ch.manual_link("New order #1"), "https://m.me/flowercafe?text=New+order+%231");
    }
}
