//! Storefront client side: talks to the HTTP API and holds the state a
//! shopper's session needs (catalog, cart, checkout progress).

use async_trait::async_trait;
use reqwest::header;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::api::response::ApiResponse;
use crate::domain::aggregates::{Category, Order, PlaceOrder, ProductWithCategories};
use crate::service::PlacedOrder;

pub mod cart;
pub mod catalog;
pub mod checkout;

pub use cart::{CartStorage, CartStore, JsonFileStorage, MemoryStorage};
pub use catalog::CatalogStore;
pub use checkout::{CheckoutFlow, CheckoutStep};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Server rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("{0}")]
    Invalid(&'static str),
}

#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn all_products(&self) -> Result<Vec<ProductWithCategories>, ClientError>;
    /// `include_admin_only` reads the back-office listing, which needs a session.
    async fn categories(&self, include_admin_only: bool) -> Result<Vec<Category>, ClientError>;
}

#[async_trait]
pub trait OrderGateway: Send + Sync {
    async fn place_order(&self, payload: &PlaceOrder) -> Result<PlacedOrder, ClientError>;
    async fn confirm_payment(&self, order_id: &str) -> Result<Order, ClientError>;
}

pub struct StorefrontClient {
    http: reqwest::Client,
    base_url: String,
    admin_token: Option<String>,
}

impl StorefrontClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.into().trim_end_matches('/').to_string(), admin_token: None }
    }

    pub fn with_admin_token(mut self, token: impl Into<String>) -> Self {
        self.admin_token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String { format!("{}{}", self.base_url, path) }

    fn admin_cookie(&self) -> Result<String, ClientError> {
        let token = self.admin_token.as_deref().ok_or(ClientError::Invalid("admin session required"))?;
        Ok(format!("{}={}", crate::api::auth::SESSION_COOKIE, token))
    }
}

/// Unwraps the `{success, data, message}` envelope.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    let body: ApiResponse<T> = response.json().await?;
    if !status.is_success() || !body.success {
        return Err(ClientError::Rejected { status: status.as_u16(), message: body.message.unwrap_or_default() });
    }
    body.data.ok_or(ClientError::Rejected { status: status.as_u16(), message: "response carried no data".into() })
}

#[async_trait]
impl CatalogSource for StorefrontClient {
    async fn all_products(&self) -> Result<Vec<ProductWithCategories>, ClientError> {
        decode(self.http.get(self.url("/api/products/all")).send().await?).await
    }

    async fn categories(&self, include_admin_only: bool) -> Result<Vec<Category>, ClientError> {
        let request = if include_admin_only {
            self.http.get(self.url("/api/admin/categories")).header(header::COOKIE, self.admin_cookie()?)
        } else {
            self.http.get(self.url("/api/categories"))
        };
        decode(request.send().await?).await
    }
}

#[async_trait]
impl OrderGateway for StorefrontClient {
    async fn place_order(&self, payload: &PlaceOrder) -> Result<PlacedOrder, ClientError> {
        decode(self.http.post(self.url("/api/orders")).json(payload).send().await?).await
    }

    async fn confirm_payment(&self, order_id: &str) -> Result<Order, ClientError> {
        let body = serde_json::json!({ "orderId": order_id });
        decode(self.http.patch(self.url("/api/orders")).json(&body).send().await?).await
    }
}
