//! Customer checkout endpoints.

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;

use super::extract::JsonBody;
use super::response::ApiResponse;
use super::AppState;
use crate::domain::aggregates::{Order, PlaceOrder};
use crate::service::PlacedOrder;
use crate::Result;

pub async fn place(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<PlaceOrder>,
) -> Result<(StatusCode, ApiResponse<PlacedOrder>)> {
    let placed = state.orders.place_order(payload).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(placed).message("Order submitted successfully")))
}

#[derive(Debug, Deserialize)]
pub struct ConfirmPayment {
    #[serde(default, rename = "orderId")]
    pub order_id: String,
}

pub async fn confirm_payment(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<ConfirmPayment>,
) -> Result<ApiResponse<Order>> {
    let order = state.orders.confirm_payment(&body.order_id).await?;
    Ok(ApiResponse::ok(order).message("Payment confirmed"))
}
