//! Product and Category aggregates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "product_status", rename_all = "lowercase")]
pub enum ProductStatus {
    Public,
    #[default]
    Draft,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub subtitle: Option<String>,
    /// Rich text (HTML) authored in the back-office editor.
    pub description: Option<String>,
    pub price: i64,
    pub discount_price: Option<i64>,
    pub status: ProductStatus,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn is_public(&self) -> bool { self.status == ProductStatus::Public }
}

/// A product with its categories resolved through the join table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductWithCategories {
    #[serde(flatten)]
    pub product: Product,
    pub categories: Vec<Category>,
}

impl ProductWithCategories {
    pub fn id(&self) -> i64 { self.product.id }
    pub fn in_category(&self, category_id: i64) -> bool { self.categories.iter().any(|c| c.id == category_id) }
}

/// Validated product payload for create and update.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate)]
pub struct ProductDraft {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "Product name must be 1 to 255 characters"))]
    pub name: String,
    #[validate(length(max = 255, message = "Subtitle is too long"))]
    pub subtitle: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    #[validate(range(min = 1, message = "Price must be positive"))]
    pub price: i64,
    #[validate(range(min = 1, message = "Discount price must be positive"))]
    pub discount_price: Option<i64>,
    #[serde(default)]
    pub status: ProductStatus,
    pub image: Option<String>,
    /// `None` leaves existing category links alone on update; `Some` replaces them.
    #[serde(rename = "categoryIds")]
    pub category_ids: Option<Vec<i64>>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate)]
pub struct CategoryDraft {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "Category name must be 1 to 255 characters"))]
    pub name: String,
}

/// Back-office product listing filter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProductQuery {
    /// Case-insensitive substring on the name.
    pub search: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    /// `None` lists every status.
    pub status: Option<ProductStatus>,
    /// Products linked to at least one of these.
    pub category_ids: Vec<i64>,
}

impl ProductQuery {
    pub fn matches(&self, product: &ProductWithCategories) -> bool {
        let p = &product.product;
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            if !p.name.to_lowercase().contains(&search.to_lowercase()) { return false; }
        }
        if self.min_price.is_some_and(|min| p.price < min) { return false; }
        if self.max_price.is_some_and(|max| p.price > max) { return false; }
        if self.status.is_some_and(|s| p.status != s) { return false; }
        self.category_ids.is_empty() || self.category_ids.iter().any(|id| product.in_category(*id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str, price: i64, status: ProductStatus, categories: &[i64]) -> ProductWithCategories {
        let now = Utc::now();
        ProductWithCategories {
            product: Product {
                id: 1, name: name.into(), subtitle: None, description: None, price, discount_price: None,
                status, image: None, created_at: now, updated_at: now,
            },
            categories: categories.iter().map(|&id| Category { id, name: format!("c{id}"), created_at: now, updated_at: now }).collect(),
        }
    }

    #[test]
    fn test_draft_defaults_to_draft_status() {
        let draft: ProductDraft = serde_json::from_value(serde_json::json!({"name": "Rose bouquet", "price": 350000})).unwrap();
        assert_eq!(draft.status, ProductStatus::Draft);
        assert!(draft.category_ids.is_none());
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_draft_rejects_bad_prices_and_names() {
        let draft = ProductDraft { name: String::new(), price: 0, discount_price: Some(-5), ..Default::default() };
        let errors = draft.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("price"));
        assert!(fields.contains_key("discount_price"));
    }

    #[test]
    fn test_product_query_matching() {
        let latte = product("Iced Latte", 45_000, ProductStatus::Public, &[3]);
        let query = ProductQuery { search: Some("latte".into()), max_price: Some(50_000), ..Default::default() };
        assert!(query.matches(&latte));
        assert!(!ProductQuery { status: Some(ProductStatus::Draft), ..Default::default() }.matches(&latte));
        assert!(!ProductQuery { category_ids: vec![9], ..Default::default() }.matches(&latte));
        assert!(ProductQuery { category_ids: vec![9, 3], ..Default::default() }.matches(&latte));
    }

    #[test]
    fn test_product_serializes_flat_with_categories() {
        let json = serde_json::to_value(product("Mocha", 50_000, ProductStatus::Public, &[4])).unwrap();
        assert_eq!(json["name"], "Mocha");
        assert_eq!(json["status"], "public");
        assert_eq!(json["categories"][0]["id"], 4);
    }
}
