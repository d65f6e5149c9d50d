//! Order Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::{Validate, ValidationError};

use crate::domain::value_objects::OrderId;

/// Delivery type recorded on storefront orders.
pub const HOME_DELIVERY: &str = "delivery";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [Self::Pending, Self::Paid, Self::Delivered, Self::Cancelled];

    pub fn as_str(&self) -> &'static str {
        match self { Self::Pending => "pending", Self::Paid => "paid", Self::Delivered => "delivered", Self::Cancelled => "cancelled" }
    }

    /// Transitions the back-office offers from this status.
    pub fn next_actions(&self) -> &'static [OrderStatus] {
        match self {
            Self::Pending => &[Self::Paid, Self::Cancelled],
            Self::Paid => &[Self::Delivered],
            Self::Delivered | Self::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool { self.next_actions().contains(&next) }

    pub fn is_terminal(&self) -> bool { self.next_actions().is_empty() }
}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|st| st.as_str() == s).ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Unpaid => "unpaid", Self::Paid => "paid", Self::Refunded => "refunded" }
    }
}

impl FromStr for PaymentStatus {
    type Err = UnknownStatus;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::Unpaid, Self::Paid, Self::Refunded].into_iter().find(|st| st.as_str() == s).ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub struct UnknownStatus(pub String);
impl std::error::Error for UnknownStatus {}
impl std::fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "Unknown status: {}", self.0) }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: i64,
    pub order_id: String,
    pub customer_name: String,
    pub customer_phone1: String,
    pub customer_phone2: Option<String>,
    pub customer_address: String,
    pub total_price: i64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub delivery_type: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn apply(&mut self, update: &StatusUpdate) {
        self.status = update.status;
        if let Some(ps) = update.payment_status { self.payment_status = ps; }
        if let Some(at) = update.paid_at { self.paid_at = Some(at); }
        if let Some(at) = update.delivered_at { self.delivered_at = Some(at); }
        self.updated_at = update.at;
    }
}

/// Snapshot of a product as it was ordered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: String,
    pub product_id: i64,
    pub product_name: String,
    pub product_price: i64,
    pub quantity: i64,
    pub item_note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    pub fn line_total(&self) -> i64 { self.product_price.saturating_mul(self.quantity) }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Field changes produced by a status change. Customer payment confirmation
/// and an admin setting `paid` share the same update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: OrderStatus,
    pub payment_status: Option<PaymentStatus>,
    pub paid_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub at: DateTime<Utc>,
}

impl StatusUpdate {
    pub fn to_status(status: OrderStatus, now: DateTime<Utc>) -> Self {
        let paid = status == OrderStatus::Paid;
        Self {
            status,
            payment_status: paid.then_some(PaymentStatus::Paid),
            paid_at: paid.then_some(now),
            delivered_at: (status == OrderStatus::Delivered).then_some(now),
            at: now,
        }
    }

    pub fn payment_confirmed(now: DateTime<Utc>) -> Self { Self::to_status(OrderStatus::Paid, now) }
}

/// Cart line as submitted at checkout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub quantity: i64,
    #[serde(default)]
    pub note: String,
}

/// Upper bounds on a submitted line. Within them no order total can overflow.
pub const MAX_LINE_QUANTITY: i64 = 10_000;
pub const MAX_UNIT_PRICE: i64 = 1_000_000_000;

impl OrderLine {
    pub fn line_total(&self) -> i64 { self.price.saturating_mul(self.quantity) }
}

impl From<&super::CartItem> for OrderLine {
    fn from(item: &super::CartItem) -> Self {
        Self { id: item.id, name: item.name.clone(), price: item.price, quantity: item.quantity, note: item.note.clone() }
    }
}

fn validate_lines(lines: &[OrderLine]) -> Result<(), ValidationError> {
    if lines.iter().any(|l| !(1..=MAX_LINE_QUANTITY).contains(&l.quantity)) {
        return Err(ValidationError::new("quantity"));
    }
    if lines.iter().any(|l| !(0..=MAX_UNIT_PRICE).contains(&l.price)) {
        return Err(ValidationError::new("price"));
    }
    if lines.iter().try_fold(0i64, |acc, l| acc.checked_add(l.price.checked_mul(l.quantity)?)).is_none() {
        return Err(ValidationError::new("total"));
    }
    Ok(())
}

/// Checkout submission body.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrder {
    #[serde(default)]
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Phone number is required"))]
    pub phone1: String,
    #[serde(default)]
    pub phone2: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Cart is empty"), custom = "validate_lines")]
    pub items: Vec<OrderLine>,
    #[serde(default)]
    pub total_price: i64,
    #[serde(default)]
    #[validate(length(min = 1, message = "Order id is required"))]
    pub order_id: String,
}

impl PlaceOrder {
    pub fn lines_total(&self) -> i64 { self.items.iter().map(OrderLine::line_total).fold(0, i64::saturating_add) }

    /// Trims the customer fields and the order id in place.
    pub fn normalize(&mut self) {
        for field in [&mut self.name, &mut self.phone1, &mut self.phone2, &mut self.address, &mut self.order_id] {
            *field = field.trim().to_string();
        }
    }

    /// Rows to persist. The stored total is the sum of the submitted lines.
    pub fn to_new_order(&self, order_id: &OrderId) -> NewOrder {
        let optional = |s: &str| Some(s.trim().to_string()).filter(|s| !s.is_empty());
        NewOrder {
            order_id: order_id.to_string(),
            customer_name: self.name.trim().to_string(),
            customer_phone1: self.phone1.trim().to_string(),
            customer_phone2: optional(&self.phone2),
            customer_address: self.address.trim().to_string(),
            total_price: self.lines_total(),
            delivery_type: HOME_DELIVERY.to_string(),
            notes: None,
            items: self.items.iter().map(|l| NewOrderItem {
                product_id: l.id,
                product_name: l.name.clone(),
                product_price: l.price,
                quantity: l.quantity,
                item_note: optional(&l.note),
            }).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewOrder {
    pub order_id: String,
    pub customer_name: String,
    pub customer_phone1: String,
    pub customer_phone2: Option<String>,
    pub customer_address: String,
    pub total_price: i64,
    pub delivery_type: String,
    pub notes: Option<String>,
    pub items: Vec<NewOrderItem>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub product_name: String,
    pub product_price: i64,
    pub quantity: i64,
    pub item_note: Option<String>,
}

/// Back-office order listing filter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrderQuery {
    /// Substring of the external order id. Customer name and phone are not searched.
    pub search: Option<String>,
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

impl OrderQuery {
    pub fn matches(&self, order: &Order) -> bool {
        if self.status.is_some_and(|s| order.status != s) { return false; }
        if self.payment_status.is_some_and(|s| order.payment_status != s) { return false; }
        match self.search.as_deref().filter(|s| !s.is_empty()) {
            Some(search) => order.order_id.to_lowercase().contains(&search.to_lowercase()),
            None => true,
        }
    }
}
