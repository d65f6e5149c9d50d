//! In-process store implementing both repositories.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::RwLock;

use super::{CatalogRepository, OrderRepository};
use crate::domain::aggregates::{
    Category, NewOrder, Order, OrderItem, OrderQuery, OrderStatus, OrderWithItems, PaymentStatus, Product,
    ProductDraft, ProductQuery, ProductWithCategories, StatusUpdate,
};
use crate::domain::value_objects::{Page, PageInfo, PageRequest};
use crate::{Result, StorefrontError};

#[derive(Default)]
struct Inner {
    products: BTreeMap<i64, Product>,
    categories: BTreeMap<i64, Category>,
    /// (product_id, category_id)
    links: BTreeSet<(i64, i64)>,
    orders: Vec<Order>,
    items: Vec<OrderItem>,
    next_product_id: i64,
    next_category_id: i64,
    next_order_id: i64,
    next_item_id: i64,
}

impl Inner {
    fn next(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }

    fn with_categories(&self, product: &Product) -> ProductWithCategories {
        let categories = self
            .links
            .range((product.id, i64::MIN)..=(product.id, i64::MAX))
            .filter_map(|(_, cid)| self.categories.get(cid).cloned())
            .collect();
        ProductWithCategories { product: product.clone(), categories }
    }

    fn replace_links(&mut self, product_id: i64, category_ids: &[i64]) {
        self.links.retain(|(pid, _)| *pid != product_id);
        self.links.extend(category_ids.iter().map(|cid| (product_id, *cid)));
    }

    fn newest_first<'a>(&'a self, mut products: Vec<&'a Product>) -> Vec<&'a Product> {
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        products
    }

    fn with_items(&self, order: &Order) -> OrderWithItems {
        let items = self.items.iter().filter(|i| i.order_id == order.order_id).cloned().collect();
        OrderWithItems { order: order.clone(), items }
    }
}

fn paginate<T>(all: Vec<T>, page: PageRequest) -> Page<T> {
    let total = all.len() as u64;
    let items = all
        .into_iter()
        .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
        .take(page.page_size() as usize)
        .collect();
    Page { items, pagination: PageInfo::new(page, total) }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn list_public_products(&self) -> Result<Vec<ProductWithCategories>> {
        let inner = self.inner.read().await;
        let public = inner.products.values().filter(|p| p.is_public()).collect();
        Ok(inner.newest_first(public).into_iter().map(|p| inner.with_categories(p)).collect())
    }

    async fn list_products(&self, query: &ProductQuery, page: PageRequest) -> Result<Page<ProductWithCategories>> {
        let inner = self.inner.read().await;
        let all = inner
            .newest_first(inner.products.values().collect())
            .into_iter()
            .map(|p| inner.with_categories(p))
            .filter(|p| query.matches(p))
            .collect();
        Ok(paginate(all, page))
    }

    async fn find_product(&self, id: i64) -> Result<Option<ProductWithCategories>> {
        let inner = self.inner.read().await;
        Ok(inner.products.get(&id).map(|p| inner.with_categories(p)))
    }

    async fn insert_product(&self, draft: &ProductDraft, now: DateTime<Utc>) -> Result<ProductWithCategories> {
        let mut inner = self.inner.write().await;
        let id = Inner::next(&mut inner.next_product_id);
        let product = Product {
            id,
            name: draft.name.clone(),
            subtitle: draft.subtitle.clone(),
            description: draft.description.clone(),
            price: draft.price,
            discount_price: draft.discount_price,
            status: draft.status,
            image: draft.image.clone(),
            created_at: now,
            updated_at: now,
        };
        inner.products.insert(id, product.clone());
        if let Some(ids) = &draft.category_ids { inner.replace_links(id, ids); }
        Ok(inner.with_categories(&product))
    }

    async fn update_product(&self, id: i64, draft: &ProductDraft, now: DateTime<Utc>) -> Result<Option<ProductWithCategories>> {
        let mut inner = self.inner.write().await;
        let Some(product) = inner.products.get_mut(&id) else { return Ok(None) };
        product.name = draft.name.clone();
        product.subtitle = draft.subtitle.clone();
        product.description = draft.description.clone();
        product.price = draft.price;
        product.discount_price = draft.discount_price;
        product.status = draft.status;
        product.image = draft.image.clone();
        product.updated_at = now;
        let product = product.clone();
        if let Some(ids) = &draft.category_ids { inner.replace_links(id, ids); }
        Ok(Some(inner.with_categories(&product)))
    }

    async fn delete_product(&self, id: i64) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let removed = inner.products.remove(&id).is_some();
        inner.links.retain(|(pid, _)| *pid != id);
        Ok(removed)
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let inner = self.inner.read().await;
        let mut all: Vec<Category> = inner.categories.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn find_category(&self, id: i64) -> Result<Option<Category>> {
        Ok(self.inner.read().await.categories.get(&id).cloned())
    }

    async fn insert_category(&self, name: &str, now: DateTime<Utc>) -> Result<Category> {
        let mut inner = self.inner.write().await;
        let id = Inner::next(&mut inner.next_category_id);
        let category = Category { id, name: name.to_string(), created_at: now, updated_at: now };
        inner.categories.insert(id, category.clone());
        Ok(category)
    }

    async fn update_category(&self, id: i64, name: &str, now: DateTime<Utc>) -> Result<Option<Category>> {
        let mut inner = self.inner.write().await;
        Ok(inner.categories.get_mut(&id).map(|c| {
            c.name = name.to_string();
            c.updated_at = now;
            c.clone()
        }))
    }

    async fn delete_category(&self, id: i64) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let removed = inner.categories.remove(&id).is_some();
        inner.links.retain(|(_, cid)| *cid != id);
        Ok(removed)
    }

    async fn count_products(&self) -> Result<u64> { Ok(self.inner.read().await.products.len() as u64) }

    async fn count_categories(&self) -> Result<u64> { Ok(self.inner.read().await.categories.len() as u64) }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn create_order(&self, order: &NewOrder, now: DateTime<Utc>) -> Result<OrderWithItems> {
        let mut inner = self.inner.write().await;
        if inner.orders.iter().any(|o| o.order_id == order.order_id) {
            return Err(StorefrontError::Conflict(format!("order {} already exists", order.order_id)));
        }
        let id = Inner::next(&mut inner.next_order_id);
        let row = Order {
            id,
            order_id: order.order_id.clone(),
            customer_name: order.customer_name.clone(),
            customer_phone1: order.customer_phone1.clone(),
            customer_phone2: order.customer_phone2.clone(),
            customer_address: order.customer_address.clone(),
            total_price: order.total_price,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            delivery_type: order.delivery_type.clone(),
            notes: order.notes.clone(),
            created_at: now,
            updated_at: now,
            paid_at: None,
            delivered_at: None,
        };
        let mut items = Vec::with_capacity(order.items.len());
        for item in &order.items {
            let item_id = Inner::next(&mut inner.next_item_id);
            items.push(OrderItem {
                id: item_id,
                order_id: order.order_id.clone(),
                product_id: item.product_id,
                product_name: item.product_name.clone(),
                product_price: item.product_price,
                quantity: item.quantity,
                item_note: item.item_note.clone(),
                created_at: now,
            });
        }
        inner.orders.push(row.clone());
        inner.items.extend(items.iter().cloned());
        Ok(OrderWithItems { order: row, items })
    }

    async fn find_order(&self, order_id: &str) -> Result<Option<Order>> {
        Ok(self.inner.read().await.orders.iter().find(|o| o.order_id == order_id).cloned())
    }

    async fn apply_status(&self, order_id: &str, update: &StatusUpdate) -> Result<Option<Order>> {
        let mut inner = self.inner.write().await;
        Ok(inner.orders.iter_mut().find(|o| o.order_id == order_id).map(|o| {
            o.apply(update);
            o.clone()
        }))
    }

    async fn list_orders(&self, query: &OrderQuery, page: PageRequest) -> Result<Page<OrderWithItems>> {
        let inner = self.inner.read().await;
        let mut matching: Vec<&Order> = inner.orders.iter().filter(|o| query.matches(o)).collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let all = matching.into_iter().map(|o| inner.with_items(o)).collect();
        Ok(paginate(all, page))
    }

    async fn count_orders(&self) -> Result<u64> { Ok(self.inner.read().await.orders.len() as u64) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{NewOrderItem, ProductStatus};

    fn draft(name: &str, categories: Option<Vec<i64>>) -> ProductDraft {
        ProductDraft { name: name.into(), price: 45_000, status: ProductStatus::Public, category_ids: categories, ..Default::default() }
    }

    fn new_order(order_id: &str) -> NewOrder {
        NewOrder {
            order_id: order_id.into(), customer_name: "Mai".into(), customer_phone1: "0901".into(), customer_phone2: None,
            customer_address: "12 Hang Bai".into(), total_price: 90_000, delivery_type: "delivery".into(), notes: None,
            items: vec![NewOrderItem { product_id: 1, product_name: "Latte".into(), product_price: 45_000, quantity: 2, item_note: None }],
        }
    }

    #[tokio::test]
    async fn test_update_replaces_links_only_when_given() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let a = store.insert_category("Coffee", now).await.unwrap();
        let b = store.insert_category("Tea", now).await.unwrap();
        let p = store.insert_product(&draft("Latte", Some(vec![a.id])), now).await.unwrap();
        assert_eq!(p.categories.len(), 1);

        let kept = store.update_product(p.id(), &draft("Latte", None), now).await.unwrap().unwrap();
        assert_eq!(kept.categories.iter().map(|c| c.id).collect::<Vec<_>>(), vec![a.id]);

        let replaced = store.update_product(p.id(), &draft("Latte", Some(vec![b.id])), now).await.unwrap().unwrap();
        assert_eq!(replaced.categories.iter().map(|c| c.id).collect::<Vec<_>>(), vec![b.id]);
    }

    #[tokio::test]
    async fn test_deletes_cascade_links() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let a = store.insert_category("Coffee", now).await.unwrap();
        let p = store.insert_product(&draft("Latte", Some(vec![a.id])), now).await.unwrap();
        assert!(store.delete_category(a.id).await.unwrap());
        assert!(store.find_product(p.id()).await.unwrap().unwrap().categories.is_empty());
        assert!(store.delete_product(p.id()).await.unwrap());
        assert!(!store.delete_product(p.id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_order_id_conflicts() {
        let store = MemoryStore::new();
        store.create_order(&new_order("123456789012"), Utc::now()).await.unwrap();
        let err = store.create_order(&new_order("123456789012"), Utc::now()).await.unwrap_err();
        assert!(matches!(err, StorefrontError::Conflict(_)));
        assert_eq!(store.count_orders().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_orders_paginates_newest_first() {
        let store = MemoryStore::new();
        let start = Utc::now();
        for i in 0..25 {
            store.create_order(&new_order(&format!("1000000000{i:02}")), start + chrono::Duration::seconds(i)).await.unwrap();
        }
        let page = store.list_orders(&OrderQuery::default(), PageRequest::new(3, 10).unwrap()).await.unwrap();
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.pagination.total_pages, 3);
        assert_eq!(page.items[0].order.order_id, "100000000004");
        assert_eq!(page.items[0].items.len(), 1);
    }
}
