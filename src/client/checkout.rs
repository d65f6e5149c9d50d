//! Four-step checkout: cart review, customer details, transfer QR, done.

use serde::{Deserialize, Serialize};

use super::cart::{CartStorage, CartStore};
use super::{ClientError, OrderGateway};
use crate::domain::aggregates::{OrderLine, PlaceOrder};
use crate::domain::value_objects::{OrderId, PaymentQr};
use crate::service::PlacedOrder;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    #[default]
    Cart,
    CustomerInfo,
    Payment,
    Success,
}

#[derive(Debug, Default)]
pub struct CheckoutFlow {
    step: CheckoutStep,
    placed: Option<PlacedOrder>,
}

impl CheckoutFlow {
    pub fn new() -> Self { Self::default() }

    pub fn step(&self) -> CheckoutStep { self.step }

    /// Order id of the submitted order, kept until the flow is closed.
    pub fn order_id(&self) -> Option<&str> { self.placed.as_ref().map(|p| p.order.order.order_id.as_str()) }

    pub fn payment(&self) -> Option<&PaymentQr> { self.placed.as_ref().map(|p| &p.payment) }

    pub fn qr_url(&self) -> Option<&str> { self.placed.as_ref().and_then(|p| p.qr_url.as_deref()) }

    /// Leaves the cart review. Returns whether the step changed.
    pub fn proceed<S: CartStorage>(&mut self, cart: &CartStore<S>) -> bool {
        if self.step == CheckoutStep::Cart && !cart.cart().is_empty() {
            self.step = CheckoutStep::CustomerInfo;
            return true;
        }
        false
    }

    pub fn back(&mut self) {
        self.step = match self.step {
            CheckoutStep::CustomerInfo => CheckoutStep::Cart,
            CheckoutStep::Payment => CheckoutStep::CustomerInfo,
            other => other,
        };
    }

    /// Submits the order under a fresh id. On failure the flow stays on the
    /// customer details step so the shopper can retry.
    pub async fn submit<S, G>(&mut self, cart: &CartStore<S>, gateway: &G) -> Result<&PlacedOrder, ClientError>
    where
        S: CartStorage,
        G: OrderGateway + ?Sized,
    {
        if self.step != CheckoutStep::CustomerInfo {
            return Err(ClientError::Invalid("order can only be submitted from the customer details step"));
        }
        let cart = cart.cart();
        if cart.is_empty() {
            return Err(ClientError::Invalid("cart is empty"));
        }
        let info = cart.user_info();
        if !info.is_complete() {
            return Err(ClientError::Invalid("name, phone and address are required"));
        }

        let payload = PlaceOrder {
            name: info.name.trim().to_string(),
            phone1: info.phone1.trim().to_string(),
            phone2: info.phone2.trim().to_string(),
            address: info.address.trim().to_string(),
            items: cart.items().iter().map(OrderLine::from).collect(),
            total_price: cart.total_price(),
            order_id: OrderId::random().into_inner(),
        };
        let placed = gateway.place_order(&payload).await.map_err(|e| {
            tracing::warn!(order_id = %payload.order_id, error = %e, "order submission failed");
            e
        })?;
        self.step = CheckoutStep::Payment;
        Ok(&*self.placed.insert(placed))
    }

    /// Reports the transfer as done and empties the cart.
    pub async fn confirm_payment<S, G>(&mut self, cart: &mut CartStore<S>, gateway: &G) -> Result<(), ClientError>
    where
        S: CartStorage,
        G: OrderGateway + ?Sized,
    {
        let order_id = match (self.step, self.order_id()) {
            (CheckoutStep::Payment, Some(id)) => id.to_string(),
            _ => return Err(ClientError::Invalid("no order awaiting payment")),
        };
        gateway.confirm_payment(&order_id).await?;
        cart.clear()?;
        self.step = CheckoutStep::Success;
        Ok(())
    }

    /// Back to the cart step. The cart itself is left alone.
    pub fn close(&mut self) {
        self.step = CheckoutStep::Cart;
        self.placed = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MemoryStorage;
    use crate::domain::aggregates::{CartProduct, Order, OrderStatus, OrderWithItems, PaymentStatus, UserInfoPatch};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct FakeGateway {
        down: AtomicBool,
        submitted: Mutex<Vec<PlaceOrder>>,
        confirmed: Mutex<Vec<String>>,
    }

    fn order(order_id: &str, total: i64) -> Order {
        let now = Utc::now();
        Order {
            id: 1, order_id: order_id.into(), customer_name: "Mai".into(), customer_phone1: "0901".into(),
            customer_phone2: None, customer_address: "12 Hang Bai".into(), total_price: total,
            status: OrderStatus::Pending, payment_status: PaymentStatus::Unpaid, delivery_type: "delivery".into(),
            notes: None, created_at: now, updated_at: now, paid_at: None, delivered_at: None,
        }
    }

    #[async_trait]
    impl OrderGateway for FakeGateway {
        async fn place_order(&self, payload: &PlaceOrder) -> Result<PlacedOrder, ClientError> {
            if self.down.load(Ordering::SeqCst) {
                return Err(ClientError::Rejected { status: 500, message: "Internal server error".into() });
            }
            self.submitted.lock().await.push(payload.clone());
            let id = OrderId::parse(payload.order_id.as_str()).map_err(|_| ClientError::Invalid("bad id"))?;
            let payment = PaymentQr::new("TCB", "3333333558", payload.total_price, &payload.name, &id);
            Ok(PlacedOrder {
                order: OrderWithItems { order: order(&payload.order_id, payload.total_price), items: Vec::new() },
                qr_url: payment.image_url(),
                payment,
            })
        }

        async fn confirm_payment(&self, order_id: &str) -> Result<Order, ClientError> {
            self.confirmed.lock().await.push(order_id.to_string());
            Ok(order(order_id, 0))
        }
    }

    fn filled_cart() -> CartStore<MemoryStorage> {
        let mut cart = CartStore::open(MemoryStorage::default());
        cart.add_item(CartProduct { id: 1, name: "Latte".into(), price: 45_000, image: None }, 2, "less ice").unwrap();
        cart
    }

    fn complete_info(cart: &mut CartStore<MemoryStorage>) {
        cart.update_user_info(UserInfoPatch {
            name: Some("Mai".into()),
            phone1: Some("0901234567".into()),
            address: Some("12 Hang Bai".into()),
            ..Default::default()
        })
        .unwrap();
    }

    #[test]
    fn test_empty_cart_cannot_proceed() {
        let mut flow = CheckoutFlow::new();
        assert!(!flow.proceed(&CartStore::open(MemoryStorage::default())));
        assert_eq!(flow.step(), CheckoutStep::Cart);

        assert!(flow.proceed(&filled_cart()));
        flow.back();
        assert_eq!(flow.step(), CheckoutStep::Cart);
        flow.back();
        assert_eq!(flow.step(), CheckoutStep::Cart);
    }

    #[tokio::test]
    async fn test_full_checkout() {
        let gateway = FakeGateway::default();
        let mut cart = filled_cart();
        let mut flow = CheckoutFlow::new();
        flow.proceed(&cart);

        assert!(matches!(flow.submit(&cart, &gateway).await, Err(ClientError::Invalid(_))));
        complete_info(&mut cart);
        flow.submit(&cart, &gateway).await.unwrap();
        assert_eq!(flow.step(), CheckoutStep::Payment);

        let submitted = gateway.submitted.lock().await[0].clone();
        assert_eq!(submitted.total_price, 90_000);
        assert_eq!(submitted.items[0].note, "less ice");
        assert!((12..=15).contains(&submitted.order_id.len()));
        assert_eq!(flow.order_id(), Some(submitted.order_id.as_str()));
        assert_eq!(flow.payment().unwrap().transfer_note, format!("Mai {}", submitted.order_id));

        flow.confirm_payment(&mut cart, &gateway).await.unwrap();
        assert_eq!(flow.step(), CheckoutStep::Success);
        assert!(cart.cart().is_empty());
        assert_eq!(cart.cart().user_info().name, "Mai");
        assert_eq!(gateway.confirmed.lock().await.as_slice(), [submitted.order_id.clone()]);

        flow.close();
        assert_eq!(flow.step(), CheckoutStep::Cart);
        assert!(flow.order_id().is_none());
    }

    #[tokio::test]
    async fn test_failed_submit_stays_for_retry() {
        let gateway = FakeGateway::default();
        gateway.down.store(true, Ordering::SeqCst);
        let mut cart = filled_cart();
        complete_info(&mut cart);
        let mut flow = CheckoutFlow::new();
        flow.proceed(&cart);

        assert!(flow.submit(&cart, &gateway).await.is_err());
        assert_eq!(flow.step(), CheckoutStep::CustomerInfo);
        assert_eq!(cart.cart().items().len(), 1);

        gateway.down.store(false, Ordering::SeqCst);
        flow.submit(&cart, &gateway).await.unwrap();
        assert_eq!(flow.step(), CheckoutStep::Payment);
    }

    #[tokio::test]
    async fn test_close_keeps_cart() {
        let gateway = FakeGateway::default();
        let mut cart = filled_cart();
        complete_info(&mut cart);
        let mut flow = CheckoutFlow::new();
        flow.proceed(&cart);
        flow.submit(&cart, &gateway).await.unwrap();
        flow.close();
        assert_eq!(flow.step(), CheckoutStep::Cart);
        assert_eq!(cart.cart().items().len(), 1);
    }
}
