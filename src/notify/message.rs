//! Human-readable notification text.

use chrono::{DateTime, FixedOffset, Utc};
use std::fmt::Write;

use crate::domain::aggregates::OrderWithItems;
use crate::domain::events::OrderEvent;
use crate::domain::value_objects::{format_vnd, transfer_note};

/// Shop-side details quoted in payment messages.
#[derive(Clone, Debug, Default)]
pub struct ShopAccount {
    pub bank_name: String,
    pub bank_account: String,
}

const SHOP_UTC_OFFSET_SECS: i32 = 7 * 3600;

fn local_time(at: DateTime<Utc>) -> String {
    const FORMAT: &str = "%H:%M:%S %d/%m/%Y";
    match FixedOffset::east_opt(SHOP_UTC_OFFSET_SECS) {
        Some(tz) => at.with_timezone(&tz).format(FORMAT).to_string(),
        None => at.format(FORMAT).to_string(),
    }
}

pub fn render(event: &OrderEvent, shop: &ShopAccount) -> String {
    match event {
        OrderEvent::Placed { order } => new_order(order),
        OrderEvent::PaymentConfirmed { order_id, customer_name, total_price, paid_at } => format!(
            "✅ *PAYMENT CONFIRMED*\n\n\
             🆔 *Order ID:* {order_id}\n\
             👤 *Customer:* {customer_name}\n\
             💰 *Amount:* {amount}\n\
             💳 *Status:* Paid\n\
             ⏰ *Confirmed at:* {at}\n\n\
             ---\n\
             📝 The customer reported paying by QR code. Check account {bank} {account}.",
            amount = format_vnd(*total_price),
            at = local_time(*paid_at),
            bank = shop.bank_name,
            account = shop.bank_account,
        ),
        OrderEvent::StatusChanged { order_id, from, to, at } => format!(
            "📦 *ORDER STATUS UPDATED*\n\n\
             🆔 *Order ID:* {order_id}\n\
             🔁 *Status:* {from} → {to}\n\
             ⏰ *Updated at:* {at}",
            from = from.as_str(),
            to = to.as_str(),
            at = local_time(*at),
        ),
    }
}

fn new_order(placed: &OrderWithItems) -> String {
    let order = &placed.order;
    let mut out = String::new();
    let _ = writeln!(out, "🛍️ *NEW ORDER - HOME DELIVERY*\n");
    let _ = writeln!(out, "🆔 *Order ID:* {}", order.order_id);
    let _ = writeln!(out, "👤 *Customer:* {}", order.customer_name);
    let _ = writeln!(out, "📞 *Phone:* {}", order.customer_phone1);
    if let Some(phone2) = order.customer_phone2.as_deref().filter(|p| !p.is_empty()) {
        let _ = writeln!(out, "📞 *Alt. phone:* {phone2}");
    }
    let _ = writeln!(out, "🏠 *Address:* {}\n", order.customer_address);
    let _ = writeln!(out, "📋 *Items:*");
    for item in &placed.items {
        let _ = write!(out, "• {} x{} - {}", item.product_name, item.quantity, format_vnd(item.line_total()));
        match item.item_note.as_deref().filter(|n| !n.is_empty()) {
            Some(note) => { let _ = writeln!(out, " ({note})"); }
            None => out.push('\n'),
        }
    }
    let _ = writeln!(out, "\n💰 *Total:* {}", format_vnd(order.total_price));
    let _ = writeln!(out, "🚚 *Type:* Home delivery");
    let _ = writeln!(out, "💳 *Transfer note:* {}\n", transfer_note(&order.customer_name, &order.order_id));
    let _ = writeln!(out, "---");
    let _ = write!(out, "⏰ Placed at: {}", local_time(order.created_at));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{Order, OrderItem, OrderStatus, PaymentStatus};
    use chrono::TimeZone;

    fn placed(phone2: Option<&str>) -> OrderWithItems {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 3, 30, 0).unwrap();
        let item = |id, name: &str, price, quantity, note: Option<&str>| OrderItem {
            id, order_id: "123456789012".into(), product_id: id, product_name: name.into(), product_price: price,
            quantity, item_note: note.map(Into::into), created_at: at,
        };
        OrderWithItems {
            order: Order {
                id: 1, order_id: "123456789012".into(), customer_name: "Lan Anh".into(), customer_phone1: "0901234567".into(),
                customer_phone2: phone2.map(Into::into), customer_address: "12 Hang Bai, Hanoi".into(), total_price: 390_000,
                status: OrderStatus::Pending, payment_status: PaymentStatus::Unpaid, delivery_type: "delivery".into(),
                notes: None, created_at: at, updated_at: at, paid_at: None, delivered_at: None,
            },
            items: vec![item(1, "Latte", 45_000, 2, Some("less ice")), item(2, "Tulip bouquet", 300_000, 1, None)],
        }
    }

    #[test]
    fn test_new_order_message_lists_lines_and_reference() {
        let text = render(&OrderEvent::Placed { order: placed(None) }, &ShopAccount::default());
        assert!(text.contains("*Order ID:* 123456789012"));
        assert!(text.contains("• Latte x2 - 90.000đ (less ice)\n"));
        assert!(text.contains("• Tulip bouquet x1 - 300.000đ\n"));
        assert!(text.contains("*Total:* 390.000đ"));
        assert!(text.contains("*Transfer note:* Lan Anh 123456789012"));
        assert!(text.contains("10:30:00 01/06/2024"));
        assert!(!text.contains("Alt. phone"));
    }

    #[test]
    fn test_new_order_message_includes_second_phone_when_given() {
        let text = render(&OrderEvent::Placed { order: placed(Some("0987654321")) }, &ShopAccount::default());
        assert!(text.contains("*Alt. phone:* 0987654321"));
    }

    #[test]
    fn test_payment_message_quotes_shop_account() {
        let shop = ShopAccount { bank_name: "TCB".into(), bank_account: "3333333558".into() };
        let event = OrderEvent::PaymentConfirmed {
            order_id: "123456789012".into(), customer_name: "Lan Anh".into(), total_price: 90_000, paid_at: Utc::now(),
        };
        let text = render(&event, &shop);
        assert!(text.starts_with("✅ *PAYMENT CONFIRMED*"));
        assert!(text.contains("Check account TCB 3333333558"));
    }
}
