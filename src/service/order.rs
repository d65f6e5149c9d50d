//! Order lifecycle: placement, customer payment confirmation and back-office
//! status changes.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::config::PaymentConfig;
use crate::domain::aggregates::{Order, OrderQuery, OrderStatus, OrderWithItems, PlaceOrder, StatusUpdate};
use crate::domain::events::OrderEvent;
use crate::domain::value_objects::{OrderId, Page, PageRequest, PaymentQr};
use crate::notify::Notifier;
use crate::repository::OrderRepository;
use crate::{Result, StorefrontError};

/// What the customer needs after placing an order.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    pub order: OrderWithItems,
    pub payment: PaymentQr,
    pub qr_url: Option<String>,
}

#[derive(Clone)]
pub struct OrderService {
    repo: Arc<dyn OrderRepository>,
    notifier: Notifier,
    payment: PaymentConfig,
}

impl OrderService {
    pub fn new(repo: Arc<dyn OrderRepository>, notifier: Notifier, payment: PaymentConfig) -> Self {
        Self { repo, notifier, payment }
    }

    pub async fn place_order(&self, mut payload: PlaceOrder) -> Result<PlacedOrder> {
        payload.normalize();
        payload
            .validate()
            .map_err(|e| StorefrontError::from_validation("Missing required fields or empty cart", e))?;
        let order_id = OrderId::parse(payload.order_id.as_str())
            .map_err(|e| StorefrontError::invalid(e.to_string()))?;

        let new_order = payload.to_new_order(&order_id);
        if payload.total_price != new_order.total_price {
            tracing::warn!(
                order_id = %order_id,
                submitted = payload.total_price,
                computed = new_order.total_price,
                "submitted total differs from line total; storing line total"
            );
        }

        let placed = self.repo.create_order(&new_order, Utc::now()).await?;
        tracing::info!(order_id = %order_id, items = placed.items.len(), total = placed.order.total_price, "order placed");

        let payment = PaymentQr::new(
            &self.payment.bank_code,
            &self.payment.bank_account,
            placed.order.total_price,
            &placed.order.customer_name,
            &order_id,
        );
        let qr_url = payment.image_url();
        self.notifier.publish(OrderEvent::Placed { order: placed.clone() }).await;
        Ok(PlacedOrder { order: placed, payment, qr_url })
    }

    /// Marks the order paid on the customer's word. Repeating it is harmless.
    pub async fn confirm_payment(&self, order_id: &str) -> Result<Order> {
        let order_id = order_id.trim();
        if order_id.is_empty() {
            return Err(StorefrontError::invalid("Missing orderId"));
        }
        let now = Utc::now();
        let order = self
            .repo
            .apply_status(order_id, &StatusUpdate::payment_confirmed(now))
            .await?
            .ok_or(StorefrontError::NotFound("Order not found"))?;
        tracing::info!(order_id, "payment confirmed by customer");

        self.notifier
            .publish(OrderEvent::PaymentConfirmed {
                order_id: order.order_id.clone(),
                customer_name: order.customer_name.clone(),
                total_price: order.total_price,
                paid_at: order.paid_at.unwrap_or(now),
            })
            .await;
        Ok(order)
    }

    pub async fn update_status(&self, order_id: &str, status: &str) -> Result<Order> {
        let order_id = order_id.trim();
        if order_id.is_empty() {
            return Err(StorefrontError::invalid("Missing orderId"));
        }
        let status: OrderStatus = status.trim().parse().map_err(|_| StorefrontError::invalid("Invalid status"))?;

        let previous = self.repo.find_order(order_id).await?.ok_or(StorefrontError::NotFound("Order not found"))?;
        if previous.status != status && !previous.status.can_transition_to(status) {
            tracing::warn!(order_id, from = previous.status.as_str(), to = status.as_str(), "status change outside the usual flow");
        }

        let now = Utc::now();
        let order = self
            .repo
            .apply_status(order_id, &StatusUpdate::to_status(status, now))
            .await?
            .ok_or(StorefrontError::NotFound("Order not found"))?;
        tracing::info!(order_id, status = status.as_str(), "order status updated");

        self.notifier
            .publish(OrderEvent::StatusChanged { order_id: order.order_id.clone(), from: previous.status, to: status, at: now })
            .await;
        Ok(order)
    }

    pub async fn list_orders(&self, query: &OrderQuery, page: PageRequest) -> Result<Page<OrderWithItems>> {
        self.repo.list_orders(query, page).await
    }

    pub async fn count_orders(&self) -> Result<u64> { self.repo.count_orders().await }
}
