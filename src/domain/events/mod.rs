//! Domain events
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::{OrderStatus, OrderWithItems};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order: OrderWithItems },
    PaymentConfirmed { order_id: String, customer_name: String, total_price: i64, paid_at: DateTime<Utc> },
    StatusChanged { order_id: String, from: OrderStatus, to: OrderStatus, at: DateTime<Utc> },
}

impl OrderEvent {
    pub fn order_id(&self) -> &str {
        match self {
            Self::Placed { order } => &order.order.order_id,
            Self::PaymentConfirmed { order_id, .. } | Self::StatusChanged { order_id, .. } => order_id,
        }
    }

    /// Short name used as a subject suffix on the event bus.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Placed { .. } => "placed",
            Self::PaymentConfirmed { .. } => "payment_confirmed",
            Self::StatusChanged { .. } => "status_changed",
        }
    }
}
