//! Telegram bot channel.

use async_trait::async_trait;
use serde_json::json;

use super::{Notification, NotificationChannel, NotifyError};
use crate::config::TelegramConfig;

const API_BASE: &str = "https://api.telegram.org";

pub struct TelegramChannel {
    client: reqwest::Client,
    config: TelegramConfig,
    api_base: String,
}

impl TelegramChannel {
    pub fn new(client: reqwest::Client, config: TelegramConfig) -> Self {
        Self { client, config, api_base: API_BASE.to_string() }
    }

    fn endpoint(&self) -> String { format!("{}/bot{}/sendMessage", self.api_base, self.config.bot_token) }
}

#[async_trait]
impl NotificationChannel for TelegramChannel {
    fn name(&self) -> &'static str { "telegram" }

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let body = json!({
            "chat_id": self.config.chat_id,
            "text": notification.message,
            "parse_mode": "Markdown",
        });
        let response = self.client.post(self.endpoint()).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(NotifyError::from_response(response).await);
        }
        Ok(())
    }
}
