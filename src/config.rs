//! Environment configuration.

use anyhow::{Context, Result};
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct Config {
    /// `None` runs on the in-memory store.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub port: u16,
    pub rust_log: String,
    pub admin: AdminConfig,
    pub payment: PaymentConfig,
    pub upload_dir: PathBuf,
    /// Prefix for links to uploaded images, e.g. `https://shop.example`.
    pub public_base_url: String,
    pub notifications: NotificationConfig,
    /// Settings that were present but unusable. Logged by the caller once
    /// tracing is up.
    pub warnings: Vec<String>,
}

/// The single back-office credential.
#[derive(Clone, Debug)]
pub struct AdminConfig {
    pub username: String,
    pub password: String,
    pub token: String,
}

#[derive(Clone, Debug, Default)]
pub struct PaymentConfig {
    pub bank_code: String,
    pub bank_account: String,
    pub bank_name: String,
}

/// Each channel is enabled by the presence of its own settings.
#[derive(Clone, Debug, Default)]
pub struct NotificationConfig {
    pub telegram: Option<TelegramConfig>,
    pub messenger: Option<MessengerConfig>,
    pub email: Option<EmailConfig>,
    pub webhook_url: Option<String>,
    pub nats: Option<NatsConfig>,
}

#[derive(Clone, Debug)]
pub struct TelegramConfig { pub bot_token: String, pub chat_id: String }

#[derive(Clone, Debug)]
pub struct MessengerConfig { pub page_id: String, pub access_token: Option<String> }

#[derive(Clone, Debug)]
pub struct EmailConfig {
    pub to: String,
    pub from: String,
    pub smtp_host: String,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
}

#[derive(Clone, Debug)]
pub struct NatsConfig { pub url: String, pub subject: String }

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let mut warnings = Vec::new();
        let port = or("PORT", "8083").parse::<u16>().context("PORT must be a valid port number")?;
        let database_max_connections = or("DATABASE_MAX_CONNECTIONS", "10")
            .parse::<u32>()
            .context("DATABASE_MAX_CONNECTIONS must be a valid number")?;

        let telegram = match (get("TELEGRAM_BOT_TOKEN"), get("TELEGRAM_CHAT_ID")) {
            (Some(bot_token), Some(chat_id)) => Some(TelegramConfig { bot_token, chat_id }),
            _ => None,
        };
        let messenger = get("FB_PAGE_ID").map(|page_id| MessengerConfig { page_id, access_token: get("FB_USER_ACCESS_TOKEN") });
        let email = match (get("NOTIFICATION_EMAIL"), get("SMTP_HOST")) {
            (Some(to), Some(smtp_host)) => Some(EmailConfig {
                from: get("SMTP_FROM").unwrap_or_else(|| to.clone()),
                to,
                smtp_host,
                smtp_username: get("SMTP_USERNAME"),
                smtp_password: get("SMTP_PASSWORD"),
            }),
            (Some(to), None) => {
                warnings.push(format!("NOTIFICATION_EMAIL ({to}) set without SMTP_HOST; email notifications disabled"));
                None
            }
            _ => None,
        };
        let nats = get("NATS_URL").map(|url| NatsConfig { url, subject: or("NATS_SUBJECT", "storefront.orders") });

        Ok(Self {
            database_url: get("DATABASE_URL"),
            database_max_connections,
            port,
            rust_log: or("RUST_LOG", "info"),
            admin: AdminConfig {
                username: or("ADMIN_USERNAME", "admin"),
                password: or("ADMIN_PASSWORD", "admin"),
                token: or("ADMIN_TOKEN", "admin-session-token"),
            },
            payment: PaymentConfig {
                bank_code: or("BANK_CODE", "TCB"),
                bank_account: or("BANK_ACCOUNT", ""),
                bank_name: or("BANK_NAME", ""),
            },
            upload_dir: PathBuf::from(or("UPLOAD_DIR", "uploads")),
            public_base_url: or("PUBLIC_BASE_URL", "").trim_end_matches('/').to_string(),
            notifications: NotificationConfig { telegram, messenger, email, webhook_url: get("WEBHOOK_URL"), nats },
            warnings,
        })
    }
}
