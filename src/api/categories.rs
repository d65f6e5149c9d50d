//! Public category reads.

use axum::extract::{Path, State};

use super::response::ApiResponse;
use super::AppState;
use crate::domain::aggregates::Category;
use crate::Result;

pub async fn list(State(state): State<AppState>) -> Result<ApiResponse<Vec<Category>>> {
    Ok(ApiResponse::ok(state.catalog.categories().await?))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> Result<ApiResponse<Category>> {
    Ok(ApiResponse::ok(state.catalog.category(id).await?))
}
