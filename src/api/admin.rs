//! Back-office endpoints. All of them sit behind [`super::auth::require_admin`].

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use super::extract::{JsonBody, QueryParams};
use super::products::{ProductPage, ProductParams};
use super::response::ApiResponse;
use super::AppState;
use crate::domain::aggregates::{
    Category, CategoryDraft, Order, OrderQuery, OrderStatus, OrderWithItems, PaymentStatus, ProductDraft,
    ProductWithCategories,
};
use crate::domain::value_objects::{PageInfo, PageRequest};
use crate::service::Counts;
use crate::{Result, StorefrontError};

pub async fn counts(State(state): State<AppState>) -> Result<ApiResponse<Counts>> {
    let orders = state.orders.count_orders().await?;
    Ok(ApiResponse::ok(state.catalog.counts(orders).await?))
}

// ---- products ----

pub async fn list_products(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<ProductParams>,
) -> Result<ApiResponse<ProductPage>> {
    let (query, page) = params.into_query()?;
    Ok(ApiResponse::ok(state.catalog.list_products(&query, page).await?.into()))
}

pub async fn get_product(State(state): State<AppState>, Path(id): Path<i64>) -> Result<ApiResponse<ProductWithCategories>> {
    Ok(ApiResponse::ok(state.catalog.product(id).await?))
}

pub async fn create_product(
    State(state): State<AppState>,
    JsonBody(draft): JsonBody<ProductDraft>,
) -> Result<(StatusCode, ApiResponse<ProductWithCategories>)> {
    let product = state.catalog.create_product(draft).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(product).message("Product created successfully")))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(draft): JsonBody<ProductDraft>,
) -> Result<ApiResponse<ProductWithCategories>> {
    let product = state.catalog.update_product(id, draft).await?;
    Ok(ApiResponse::ok(product).message("Product updated successfully"))
}

pub async fn delete_product(State(state): State<AppState>, Path(id): Path<i64>) -> Result<ApiResponse<()>> {
    state.catalog.delete_product(id).await?;
    Ok(ApiResponse::done("Product deleted successfully"))
}

// ---- categories ----

pub async fn list_categories(State(state): State<AppState>) -> Result<ApiResponse<Vec<Category>>> {
    Ok(ApiResponse::ok(state.catalog.categories().await?))
}

pub async fn get_category(State(state): State<AppState>, Path(id): Path<i64>) -> Result<ApiResponse<Category>> {
    Ok(ApiResponse::ok(state.catalog.category(id).await?))
}

pub async fn create_category(
    State(state): State<AppState>,
    JsonBody(draft): JsonBody<CategoryDraft>,
) -> Result<(StatusCode, ApiResponse<Category>)> {
    let category = state.catalog.create_category(draft).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(category).message("Category created successfully")))
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(draft): JsonBody<CategoryDraft>,
) -> Result<ApiResponse<Category>> {
    let category = state.catalog.update_category(id, draft).await?;
    Ok(ApiResponse::ok(category).message("Category updated successfully"))
}

pub async fn delete_category(State(state): State<AppState>, Path(id): Path<i64>) -> Result<ApiResponse<()>> {
    state.catalog.delete_category(id).await?;
    Ok(ApiResponse::done("Category deleted successfully"))
}

// ---- orders ----

/// `status` and `paymentStatus` accept `all` to disable the filter.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderParams {
    pub search: Option<String>,
    pub status: Option<String>,
    pub payment_status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

fn filter<T: std::str::FromStr>(raw: Option<&str>, message: &'static str) -> Result<Option<T>> {
    match raw.map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(|_| StorefrontError::invalid(message)),
    }
}

impl OrderParams {
    pub fn into_query(self) -> Result<(OrderQuery, PageRequest)> {
        let page = PageRequest::new(self.page.unwrap_or(1), self.limit.unwrap_or(10))
            .map_err(|e| StorefrontError::invalid(e.to_string()))?;
        let query = OrderQuery {
            search: self.search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            status: filter::<OrderStatus>(self.status.as_deref(), "Invalid status")?,
            payment_status: filter::<PaymentStatus>(self.payment_status.as_deref(), "Invalid payment status")?,
        };
        Ok((query, page))
    }
}

#[derive(Debug, Serialize)]
pub struct OrderPage {
    pub orders: Vec<OrderWithItems>,
    pub pagination: PageInfo,
}

pub async fn list_orders(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<OrderParams>,
) -> Result<ApiResponse<OrderPage>> {
    let (query, page) = params.into_query()?;
    let page = state.orders.list_orders(&query, page).await?;
    Ok(ApiResponse::ok(OrderPage { orders: page.items, pagination: page.pagination }).message("Orders retrieved successfully"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub status: String,
}

pub async fn update_order_status(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<StatusChange>,
) -> Result<ApiResponse<Order>> {
    let order = state.orders.update_status(&body.order_id, &body.status).await?;
    Ok(ApiResponse::ok(order).message("Order status updated successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_params_treat_all_as_no_filter() {
        let params = OrderParams {
            status: Some("all".into()),
            payment_status: Some("paid".into()),
            search: Some(" 1234 ".into()),
            ..Default::default()
        };
        let (query, page) = params.into_query().unwrap();
        assert_eq!(query.status, None);
        assert_eq!(query.payment_status, Some(PaymentStatus::Paid));
        assert_eq!(query.search.as_deref(), Some("1234"));
        assert_eq!(page, PageRequest::default());
    }

    #[test]
    fn test_order_params_reject_unknown_status() {
        let err = OrderParams { status: Some("shipped".into()), ..Default::default() }.into_query().unwrap_err();
        assert!(matches!(err, StorefrontError::Validation { ref message, .. } if message == "Invalid status"));
    }
}
