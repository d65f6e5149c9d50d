//! Postgres repositories over `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPool, Postgres, QueryBuilder, Transaction};
use std::collections::HashMap;

use super::{CatalogRepository, OrderRepository};
use crate::domain::aggregates::{
    Category, NewOrder, Order, OrderItem, OrderQuery, OrderWithItems, Product, ProductDraft, ProductQuery,
    ProductWithCategories, StatusUpdate,
};
use crate::domain::value_objects::{Page, PageInfo, PageRequest};
use crate::{Result, StorefrontError};

const PRODUCT_COLUMNS: &str = "id, name, subtitle, description, price, discount_price, status, image, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ProductCategoryRow {
    product_id: i64,
    #[sqlx(flatten)]
    category: Category,
}

/// Escapes `%`, `_` and `\` for use inside an `ILIKE` pattern.
fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for ch in search.chars() {
        if matches!(ch, '%' | '_' | '\\') { escaped.push('\\'); }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn total(count: i64) -> u64 { u64::try_from(count).unwrap_or(0) }

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }

    async fn attach_categories(&self, products: Vec<Product>) -> Result<Vec<ProductWithCategories>> {
        if products.is_empty() { return Ok(Vec::new()); }
        let ids: Vec<i64> = products.iter().map(|p| p.id).collect();
        let rows = sqlx::query_as::<_, ProductCategoryRow>(
            "SELECT pc.product_id, c.id, c.name, c.created_at, c.updated_at FROM product_categories pc \
             JOIN categories c ON c.id = pc.category_id WHERE pc.product_id = ANY($1) ORDER BY c.id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_product: HashMap<i64, Vec<Category>> = HashMap::new();
        for row in rows { by_product.entry(row.product_id).or_default().push(row.category); }
        Ok(products
            .into_iter()
            .map(|product| {
                let categories = by_product.remove(&product.id).unwrap_or_default();
                ProductWithCategories { product, categories }
            })
            .collect())
    }

    async fn with_categories(&self, product: Product) -> Result<ProductWithCategories> {
        let mut resolved = self.attach_categories(vec![product]).await?;
        resolved.pop().ok_or(StorefrontError::NotFound("Product not found"))
    }

    async fn replace_links(tx: &mut Transaction<'_, Postgres>, product_id: i64, category_ids: &[i64]) -> Result<()> {
        sqlx::query("DELETE FROM product_categories WHERE product_id = $1").bind(product_id).execute(&mut **tx).await?;
        if !category_ids.is_empty() {
            sqlx::query("INSERT INTO product_categories (product_id, category_id) SELECT $1, UNNEST($2::BIGINT[]) ON CONFLICT DO NOTHING")
                .bind(product_id)
                .bind(category_ids)
                .execute(&mut **tx)
                .await?;
        }
        Ok(())
    }

    async fn attach_items(&self, orders: Vec<Order>) -> Result<Vec<OrderWithItems>> {
        if orders.is_empty() { return Ok(Vec::new()); }
        let keys: Vec<String> = orders.iter().map(|o| o.order_id.clone()).collect();
        let items = sqlx::query_as::<_, OrderItem>("SELECT * FROM order_items WHERE order_id = ANY($1) ORDER BY id")
            .bind(&keys)
            .fetch_all(&self.pool)
            .await?;
        let mut by_order: HashMap<String, Vec<OrderItem>> = HashMap::new();
        for item in items { by_order.entry(item.order_id.clone()).or_default().push(item); }
        Ok(orders
            .into_iter()
            .map(|order| {
                let items = by_order.remove(&order.order_id).unwrap_or_default();
                OrderWithItems { order, items }
            })
            .collect())
    }
}

fn push_product_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &ProductQuery) {
    qb.push(" WHERE TRUE");
    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        qb.push(" AND name ILIKE ").push_bind(like_pattern(search));
    }
    if let Some(min) = query.min_price { qb.push(" AND price >= ").push_bind(min); }
    if let Some(max) = query.max_price { qb.push(" AND price <= ").push_bind(max); }
    if let Some(status) = query.status { qb.push(" AND status = ").push_bind(status); }
    if !query.category_ids.is_empty() {
        qb.push(" AND id IN (SELECT product_id FROM product_categories WHERE category_id = ANY(")
            .push_bind(query.category_ids.clone())
            .push("))");
    }
}

fn push_order_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &OrderQuery) {
    qb.push(" WHERE TRUE");
    if let Some(status) = query.status { qb.push(" AND status = ").push_bind(status); }
    if let Some(ps) = query.payment_status { qb.push(" AND payment_status = ").push_bind(ps); }
    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        qb.push(" AND order_id ILIKE ").push_bind(like_pattern(search));
    }
}

#[async_trait]
impl CatalogRepository for PgStore {
    async fn list_public_products(&self) -> Result<Vec<ProductWithCategories>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE status = 'public' ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        self.attach_categories(products).await
    }

    async fn list_products(&self, query: &ProductQuery, page: PageRequest) -> Result<Page<ProductWithCategories>> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM products");
        push_product_filters(&mut count, query);
        let total_items: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products"));
        push_product_filters(&mut select, query);
        select.push(" ORDER BY created_at DESC, id DESC LIMIT ").push_bind(page.limit()).push(" OFFSET ").push_bind(page.offset());
        let products = select.build_query_as::<Product>().fetch_all(&self.pool).await?;

        Ok(Page { items: self.attach_categories(products).await?, pagination: PageInfo::new(page, total(total_items)) })
    }

    async fn find_product(&self, id: i64) -> Result<Option<ProductWithCategories>> {
        let product = sqlx::query_as::<_, Product>(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match product {
            Some(p) => Ok(Some(self.with_categories(p).await?)),
            None => Ok(None),
        }
    }

    async fn insert_product(&self, draft: &ProductDraft, now: DateTime<Utc>) -> Result<ProductWithCategories> {
        let mut tx = self.pool.begin().await?;
        let product = sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO products (name, subtitle, description, price, discount_price, status, image, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8) RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&draft.name).bind(&draft.subtitle).bind(&draft.description).bind(draft.price)
        .bind(draft.discount_price).bind(draft.status).bind(&draft.image).bind(now)
        .fetch_one(&mut *tx)
        .await?;
        if let Some(ids) = &draft.category_ids { Self::replace_links(&mut tx, product.id, ids).await?; }
        tx.commit().await?;
        self.with_categories(product).await
    }

    async fn update_product(&self, id: i64, draft: &ProductDraft, now: DateTime<Utc>) -> Result<Option<ProductWithCategories>> {
        let mut tx = self.pool.begin().await?;
        let product = sqlx::query_as::<_, Product>(&format!(
            "UPDATE products SET name = $2, subtitle = $3, description = $4, price = $5, discount_price = $6, \
             status = $7, image = $8, updated_at = $9 WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id).bind(&draft.name).bind(&draft.subtitle).bind(&draft.description).bind(draft.price)
        .bind(draft.discount_price).bind(draft.status).bind(&draft.image).bind(now)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(product) = product else { return Ok(None) };
        if let Some(ids) = &draft.category_ids { Self::replace_links(&mut tx, id, ids).await?; }
        tx.commit().await?;
        Ok(Some(self.with_categories(product).await?))
    }

    async fn delete_product(&self, id: i64) -> Result<bool> {
        let done = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(done.rows_affected() > 0)
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        Ok(sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name").fetch_all(&self.pool).await?)
    }

    async fn find_category(&self, id: i64) -> Result<Option<Category>> {
        Ok(sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1").bind(id).fetch_optional(&self.pool).await?)
    }

    async fn insert_category(&self, name: &str, now: DateTime<Utc>) -> Result<Category> {
        Ok(sqlx::query_as::<_, Category>("INSERT INTO categories (name, created_at, updated_at) VALUES ($1, $2, $2) RETURNING *")
            .bind(name)
            .bind(now)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_category(&self, id: i64, name: &str, now: DateTime<Utc>) -> Result<Option<Category>> {
        Ok(sqlx::query_as::<_, Category>("UPDATE categories SET name = $2, updated_at = $3 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(name)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_category(&self, id: i64) -> Result<bool> {
        let done = sqlx::query("DELETE FROM categories WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(done.rows_affected() > 0)
    }

    async fn count_products(&self) -> Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products").fetch_one(&self.pool).await?;
        Ok(total(n))
    }

    async fn count_categories(&self) -> Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories").fetch_one(&self.pool).await?;
        Ok(total(n))
    }
}

#[async_trait]
impl OrderRepository for PgStore {
    async fn create_order(&self, order: &NewOrder, now: DateTime<Utc>) -> Result<OrderWithItems> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, Order>(
            "INSERT INTO orders (order_id, customer_name, customer_phone1, customer_phone2, customer_address, total_price, \
             status, payment_status, delivery_type, notes, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, 'pending', 'unpaid', $7, $8, $9, $9) RETURNING *",
        )
        .bind(&order.order_id).bind(&order.customer_name).bind(&order.customer_phone1).bind(&order.customer_phone2)
        .bind(&order.customer_address).bind(order.total_price).bind(&order.delivery_type).bind(&order.notes).bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return StorefrontError::Conflict(format!("order {} already exists", order.order_id));
                }
            }
            StorefrontError::Database(e)
        })?;

        let product_ids: Vec<i64> = order.items.iter().map(|i| i.product_id).collect();
        let names: Vec<String> = order.items.iter().map(|i| i.product_name.clone()).collect();
        let prices: Vec<i64> = order.items.iter().map(|i| i.product_price).collect();
        let quantities: Vec<i64> = order.items.iter().map(|i| i.quantity).collect();
        let notes: Vec<Option<String>> = order.items.iter().map(|i| i.item_note.clone()).collect();
        let mut items = sqlx::query_as::<_, OrderItem>(
            "INSERT INTO order_items (order_id, product_id, product_name, product_price, quantity, item_note, created_at) \
             SELECT $1, u.product_id, u.product_name, u.product_price, u.quantity, u.item_note, $7 \
             FROM UNNEST($2::BIGINT[], $3::TEXT[], $4::BIGINT[], $5::BIGINT[], $6::TEXT[]) \
             AS u(product_id, product_name, product_price, quantity, item_note) RETURNING *",
        )
        .bind(&order.order_id).bind(&product_ids).bind(&names).bind(&prices).bind(&quantities).bind(&notes).bind(now)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        items.sort_by_key(|i| i.id);
        Ok(OrderWithItems { order: row, items })
    }

    async fn find_order(&self, order_id: &str) -> Result<Option<Order>> {
        Ok(sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE order_id = $1").bind(order_id).fetch_optional(&self.pool).await?)
    }

    async fn apply_status(&self, order_id: &str, update: &StatusUpdate) -> Result<Option<Order>> {
        Ok(sqlx::query_as::<_, Order>(
            "UPDATE orders SET status = $2, payment_status = COALESCE($3, payment_status), paid_at = COALESCE($4, paid_at), \
             delivered_at = COALESCE($5, delivered_at), updated_at = $6 WHERE order_id = $1 RETURNING *",
        )
        .bind(order_id).bind(update.status).bind(update.payment_status).bind(update.paid_at).bind(update.delivered_at).bind(update.at)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_orders(&self, query: &OrderQuery, page: PageRequest) -> Result<Page<OrderWithItems>> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM orders");
        push_order_filters(&mut count, query);
        let total_items: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::new("SELECT * FROM orders");
        push_order_filters(&mut select, query);
        select.push(" ORDER BY created_at DESC, id DESC LIMIT ").push_bind(page.limit()).push(" OFFSET ").push_bind(page.offset());
        let orders = select.build_query_as::<Order>().fetch_all(&self.pool).await?;

        Ok(Page { items: self.attach_items(orders).await?, pagination: PageInfo::new(page, total(total_items)) })
    }

    async fn count_orders(&self) -> Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders").fetch_one(&self.pool).await?;
        Ok(total(n))
    }
}
