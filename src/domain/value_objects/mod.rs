//! Value Objects for the storefront

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Customer-facing order key, distinct from the row's surrogate id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub const MIN_DIGITS: usize = 12;
    pub const MAX_DIGITS: usize = 15;
    const MAX_LEN: usize = 64;

    /// Random 12 to 15 decimal digits. Not unique by construction; the store
    /// rejects a key that is already taken.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let len = rng.gen_range(Self::MIN_DIGITS..=Self::MAX_DIGITS);
        let digits = (0..len).map(|_| char::from(b'0' + rng.gen_range(0..10u8))).collect();
        Self(digits)
    }

    pub fn random() -> Self { Self::generate(&mut rand::thread_rng()) }

    pub fn parse(value: impl Into<String>) -> Result<Self, OrderIdError> {
        let value = value.into().trim().to_string();
        if value.is_empty() { return Err(OrderIdError::Empty); }
        if value.len() > Self::MAX_LEN { return Err(OrderIdError::TooLong); }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str { &self.0 }
    pub fn into_inner(self) -> String { self.0 }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum OrderIdError { Empty, TooLong }
impl std::error::Error for OrderIdError {}
impl fmt::Display for OrderIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Empty => write!(f, "Order id empty"), Self::TooLong => write!(f, "Order id too long") }
    }
}

/// Formats an amount in đồng with dot thousands separators, e.g. `85.000đ`.
pub fn format_vnd(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 { out.push('.'); }
        out.push(ch);
    }
    if amount < 0 { out.insert(0, '-'); }
    out.push('đ');
    out
}

/// 1-indexed offset pagination request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest { page: u32, page_size: u32 }

impl PageRequest {
    pub const MAX_PAGE_SIZE: u32 = 100;

    pub fn new(page: u32, page_size: u32) -> Result<Self, PageError> {
        if page == 0 { return Err(PageError::ZeroPage); }
        if page_size == 0 || page_size > Self::MAX_PAGE_SIZE { return Err(PageError::PageSize); }
        Ok(Self { page, page_size })
    }

    pub fn page(&self) -> u32 { self.page }
    pub fn page_size(&self) -> u32 { self.page_size }
    pub fn offset(&self) -> i64 { i64::from(self.page - 1) * i64::from(self.page_size) }
    pub fn limit(&self) -> i64 { i64::from(self.page_size) }
}

impl Default for PageRequest { fn default() -> Self { Self { page: 1, page_size: 10 } } }

#[derive(Debug, Clone, PartialEq, Eq)] pub enum PageError { ZeroPage, PageSize }
impl std::error::Error for PageError {}
impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroPage => write!(f, "Page must be positive"),
            Self::PageSize => write!(f, "Page size must be between 1 and {}", PageRequest::MAX_PAGE_SIZE),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub items_per_page: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl PageInfo {
    pub fn new(request: PageRequest, total_items: u64) -> Self {
        let size = u64::from(request.page_size);
        let total_pages = u32::try_from(total_items.div_ceil(size)).unwrap_or(u32::MAX);
        Self {
            current_page: request.page,
            total_pages,
            total_items,
            items_per_page: request.page_size,
            has_next_page: request.page < total_pages,
            has_prev_page: request.page > 1,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: PageInfo,
}

/// Bank transfer QR rendered by the VietQR image service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentQr {
    pub bank_code: String,
    pub account: String,
    pub amount: i64,
    pub transfer_note: String,
}

impl PaymentQr {
    const BASE: &'static str = "https://img.vietqr.io/image";

    pub fn new(bank_code: &str, account: &str, amount: i64, customer_name: &str, order_id: &OrderId) -> Self {
        Self {
            bank_code: bank_code.to_string(),
            account: account.to_string(),
            amount,
            transfer_note: transfer_note(customer_name, order_id.as_str()),
        }
    }

    pub fn image_url(&self) -> Option<String> {
        let base = format!("{}/{}-{}-compact2.png", Self::BASE, self.bank_code, self.account);
        let amount = self.amount.to_string();
        reqwest::Url::parse_with_params(&base, &[("amount", amount.as_str()), ("addInfo", self.transfer_note.as_str())])
            .ok()
            .map(String::from)
    }
}

/// Reference the customer writes on the transfer: `"<name> <order id>"`.
pub fn transfer_note(customer_name: &str, order_id: &str) -> String {
    format!("{} {}", customer_name.trim(), order_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_generated_order_id_is_12_to_15_digits() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let id = OrderId::generate(&mut rng);
            assert!((OrderId::MIN_DIGITS..=OrderId::MAX_DIGITS).contains(&id.as_str().len()));
            assert!(id.as_str().chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_order_id_parse() {
        assert_eq!(OrderId::parse("  123456789012 ").unwrap().as_str(), "123456789012");
        assert_eq!(OrderId::parse("   "), Err(OrderIdError::Empty));
    }

    #[test]
    fn test_format_vnd() {
        assert_eq!(format_vnd(0), "0đ");
        assert_eq!(format_vnd(85_000), "85.000đ");
        assert_eq!(format_vnd(1_250_000), "1.250.000đ");
    }

    #[test]
    fn test_pagination_arithmetic() {
        let info = |page| PageInfo::new(PageRequest::new(page, 20).unwrap(), 45);
        assert_eq!(info(1).total_pages, 3);
        assert!(info(1).has_next_page && !info(1).has_prev_page);
        assert!(info(2).has_next_page && info(2).has_prev_page);
        assert!(!info(3).has_next_page && info(3).has_prev_page);
        assert_eq!(PageInfo::new(PageRequest::default(), 0).total_pages, 0);
    }

    #[test]
    fn test_page_request_bounds() {
        assert_eq!(PageRequest::new(0, 10), Err(PageError::ZeroPage));
        assert_eq!(PageRequest::new(1, 101), Err(PageError::PageSize));
        assert_eq!(PageRequest::new(3, 20).unwrap().offset(), 40);
    }

    #[test]
    fn test_payment_qr_url_carries_amount_and_note() {
        let qr = PaymentQr::new("TCB", "3333333558", 120_000, "Lan Anh", &OrderId::parse("123456789012").unwrap());
        assert_eq!(qr.transfer_note, "Lan Anh 123456789012");
        let url = qr.image_url().unwrap();
        assert!(url.starts_with("https://img.vietqr.io/image/TCB-3333333558-compact2.png?"));
        assert!(url.contains("amount=120000"));
        assert!(url.contains("addInfo=Lan+Anh+123456789012"));
    }
}
