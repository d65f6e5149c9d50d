//! Email channel over SMTP.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{Notification, NotificationChannel, NotifyError};
use crate::config::EmailConfig;
use crate::domain::events::OrderEvent;

pub struct EmailChannel {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
    to: String,
}

impl EmailChannel {
    pub fn new(config: &EmailConfig) -> Result<Self, NotifyError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| NotifyError::Email(e.to_string()))?;
        if let (Some(user), Some(pass)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }
        Ok(Self { mailer: builder.build(), from: config.from.clone(), to: config.to.clone() })
    }
}

pub fn subject(event: &OrderEvent) -> String {
    match event {
        OrderEvent::Placed { order } => format!("New order {}", order.order.order_id),
        OrderEvent::PaymentConfirmed { order_id, .. } => format!("Payment confirmed for order {order_id}"),
        OrderEvent::StatusChanged { order_id, to, .. } => format!("Order {order_id} is now {}", to.as_str()),
    }
}

#[async_trait]
impl NotificationChannel for EmailChannel {
    fn name(&self) -> &'static str { "email" }

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let email = Message::builder()
            .from(self.from.parse().map_err(|e: lettre::address::AddressError| NotifyError::Email(e.to_string()))?)
            .to(self.to.parse().map_err(|e: lettre::address::AddressError| NotifyError::Email(e.to_string()))?)
            .subject(subject(&notification.event))
            .header(ContentType::TEXT_PLAIN)
            .body(notification.message.clone())
            .map_err(|e| NotifyError::Email(e.to_string()))?;
        self.mailer.send(email).await.map_err(|e| NotifyError::Email(e.to_string()))?;
        Ok(())
    }
}
