//! Storage seams. `postgres` backs the running service; `memory` backs tests
//! and database-less local runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::aggregates::{
    Category, NewOrder, Order, OrderQuery, OrderWithItems, ProductDraft, ProductQuery, ProductWithCategories,
    StatusUpdate,
};
use crate::domain::value_objects::{Page, PageRequest};
use crate::Result;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Every public product, newest first, with categories resolved.
    async fn list_public_products(&self) -> Result<Vec<ProductWithCategories>>;
    async fn list_products(&self, query: &ProductQuery, page: PageRequest) -> Result<Page<ProductWithCategories>>;
    async fn find_product(&self, id: i64) -> Result<Option<ProductWithCategories>>;
    /// Inserts the product and its category links as one unit.
    async fn insert_product(&self, draft: &ProductDraft, now: DateTime<Utc>) -> Result<ProductWithCategories>;
    /// `None` when the product does not exist. Category links are replaced
    /// only when the draft carries `category_ids`.
    async fn update_product(&self, id: i64, draft: &ProductDraft, now: DateTime<Utc>) -> Result<Option<ProductWithCategories>>;
    /// Returns whether a row was removed. Category links go with it.
    async fn delete_product(&self, id: i64) -> Result<bool>;

    /// Ordered by name.
    async fn list_categories(&self) -> Result<Vec<Category>>;
    async fn find_category(&self, id: i64) -> Result<Option<Category>>;
    async fn insert_category(&self, name: &str, now: DateTime<Utc>) -> Result<Category>;
    async fn update_category(&self, id: i64, name: &str, now: DateTime<Utc>) -> Result<Option<Category>>;
    async fn delete_category(&self, id: i64) -> Result<bool>;

    async fn count_products(&self) -> Result<u64>;
    async fn count_categories(&self) -> Result<u64>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Writes the order and all of its items atomically. Fails with
    /// `Conflict` when the external order id is already taken.
    async fn create_order(&self, order: &NewOrder, now: DateTime<Utc>) -> Result<OrderWithItems>;
    async fn find_order(&self, order_id: &str) -> Result<Option<Order>>;
    /// Applies the update to the order matched by its external id.
    async fn apply_status(&self, order_id: &str, update: &StatusUpdate) -> Result<Option<Order>>;
    /// Newest first, items embedded.
    async fn list_orders(&self, query: &OrderQuery, page: PageRequest) -> Result<Page<OrderWithItems>>;
    async fn count_orders(&self) -> Result<u64>;
}
