//! Product listings for the storefront and the back office.

use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use super::extract::QueryParams;
use super::response::ApiResponse;
use super::AppState;
use crate::domain::aggregates::{ProductQuery, ProductStatus, ProductWithCategories};
use crate::domain::value_objects::{Page, PageInfo, PageRequest};
use crate::{Result, StorefrontError};

/// Listing parameters shared by the storefront and back-office product lists.
/// `categoryIds` is comma separated; `status=all` lists every status.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub search: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub status: Option<String>,
    pub category_ids: Option<String>,
}

impl ProductParams {
    pub fn into_query(self) -> Result<(ProductQuery, PageRequest)> {
        let page = PageRequest::new(self.page.unwrap_or(1), self.page_size.unwrap_or(10))
            .map_err(|e| StorefrontError::invalid(e.to_string()))?;
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some("public") => Some(ProductStatus::Public),
            Some("draft") => Some(ProductStatus::Draft),
            Some(_) => return Err(StorefrontError::invalid("Invalid status")),
        };
        let category_ids = match self.category_ids.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(raw) => raw
                .split(',')
                .map(|id| id.trim().parse::<i64>())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|_| StorefrontError::invalid("Invalid categoryIds"))?,
            None => Vec::new(),
        };
        let query = ProductQuery {
            search: self.search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            min_price: self.min_price,
            max_price: self.max_price,
            status,
            category_ids,
        };
        Ok((query, page))
    }
}

#[derive(Debug, Serialize)]
pub struct ProductPage {
    pub products: Vec<ProductWithCategories>,
    pub pagination: PageInfo,
}

impl From<Page<ProductWithCategories>> for ProductPage {
    fn from(page: Page<ProductWithCategories>) -> Self { Self { products: page.items, pagination: page.pagination } }
}

pub async fn list_all(State(state): State<AppState>) -> Result<ApiResponse<Vec<ProductWithCategories>>> {
    Ok(ApiResponse::ok(state.catalog.public_products().await?))
}

pub async fn list(State(state): State<AppState>, QueryParams(params): QueryParams<ProductParams>) -> Result<ApiResponse<ProductPage>> {
    let (query, page) = params.into_query()?;
    Ok(ApiResponse::ok(state.catalog.public_page(query, page).await?.into()))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> Result<ApiResponse<ProductWithCategories>> {
    Ok(ApiResponse::ok(state.catalog.public_product(id).await?))
}

pub async fn random(State(state): State<AppState>) -> Result<ApiResponse<Vec<ProductWithCategories>>> {
    Ok(ApiResponse::ok(state.catalog.featured_picks().await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_parse_filters() {
        let params = ProductParams {
            page: Some(2),
            page_size: Some(20),
            search: Some("  rose ".into()),
            status: Some("all".into()),
            category_ids: Some("3, 9".into()),
            ..Default::default()
        };
        let (query, page) = params.into_query().unwrap();
        assert_eq!(query.search.as_deref(), Some("rose"));
        assert_eq!(query.status, None);
        assert_eq!(query.category_ids, vec![3, 9]);
        assert_eq!(page.offset(), 20);
    }

    #[test]
    fn test_params_reject_garbage() {
        assert!(ProductParams { status: Some("archived".into()), ..Default::default() }.into_query().is_err());
        assert!(ProductParams { category_ids: Some("3,x".into()), ..Default::default() }.into_query().is_err());
        assert!(ProductParams { page_size: Some(500), ..Default::default() }.into_query().is_err());
    }
}
