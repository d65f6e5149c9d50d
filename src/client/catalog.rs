//! Catalog state held by the storefront between page views.

use super::{CatalogSource, ClientError};
use crate::domain::aggregates::{Category, ProductWithCategories};
use crate::domain::catalog::{filter_products, CatalogFilter, DisplayPolicy, ProductSection};

pub struct CatalogStore<C> {
    source: C,
    products: Vec<ProductWithCategories>,
    categories: Vec<Category>,
    error: Option<String>,
    policy: DisplayPolicy,
}

impl<C: CatalogSource> CatalogStore<C> {
    pub fn new(source: C) -> Self {
        Self { source, products: Vec::new(), categories: Vec::new(), error: None, policy: DisplayPolicy::default() }
    }

    pub fn with_policy(mut self, policy: DisplayPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn products(&self) -> &[ProductWithCategories] { &self.products }
    pub fn categories(&self) -> &[Category] { &self.categories }
    /// Message from the last failed fetch, cleared by the next success.
    pub fn error(&self) -> Option<&str> { self.error.as_deref() }

    /// Replaces the product list. On failure the previous list stays.
    pub async fn fetch_all_products(&mut self) -> Result<(), ClientError> {
        match self.source.all_products().await {
            Ok(products) => {
                self.products = products;
                self.error = None;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load products");
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn fetch_categories(&mut self, include_admin_only: bool) -> Result<(), ClientError> {
        match self.source.categories(include_admin_only).await {
            Ok(categories) => {
                self.categories = categories;
                self.error = None;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load categories");
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn filtered(&self, filter: &CatalogFilter) -> Vec<ProductWithCategories> { filter_products(&self.products, filter) }

    pub fn display_categories(&self) -> Vec<Category> { self.policy.display_categories(&self.categories) }

    /// Sections for the products page, after applying the filter.
    pub fn sections(&self, filter: &CatalogFilter) -> Vec<ProductSection> {
        self.policy.build_sections(&self.filtered(filter), &self.categories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{Product, ProductStatus};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct FakeSource {
        down: AtomicBool,
    }

    fn category(id: i64, name: &str) -> Category {
        let now = Utc::now();
        Category { id, name: name.into(), created_at: now, updated_at: now }
    }

    fn product(id: i64, name: &str, categories: Vec<Category>) -> ProductWithCategories {
        let now = Utc::now();
        ProductWithCategories {
            product: Product {
                id, name: name.into(), subtitle: None, description: None, price: 40_000, discount_price: None,
                status: ProductStatus::Public, image: None, created_at: now, updated_at: now,
            },
            categories,
        }
    }

    #[async_trait]
    impl CatalogSource for FakeSource {
        async fn all_products(&self) -> Result<Vec<ProductWithCategories>, ClientError> {
            if self.down.load(Ordering::SeqCst) {
                return Err(ClientError::Rejected { status: 500, message: "Internal server error".into() });
            }
            Ok(vec![product(1, "Latte", vec![category(3, "Coffee")]), product(2, "Gift card", vec![category(1, "Hidden")])])
        }

        async fn categories(&self, include_admin_only: bool) -> Result<Vec<Category>, ClientError> {
            let mut all = vec![category(3, "Coffee"), category(9, "Tea")];
            if include_admin_only {
                all.push(category(1, "Hidden"));
            }
            Ok(all)
        }
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_products() {
        let mut store = CatalogStore::new(FakeSource::default());
        store.fetch_all_products().await.unwrap();
        assert_eq!(store.products().len(), 2);

        store.source.down.store(true, Ordering::SeqCst);
        assert!(store.fetch_all_products().await.is_err());
        assert_eq!(store.products().len(), 2);
        assert!(store.error().unwrap().contains("500"));

        store.source.down.store(false, Ordering::SeqCst);
        store.fetch_all_products().await.unwrap();
        assert!(store.error().is_none());
    }

    #[tokio::test]
    async fn test_sections_follow_display_policy() {
        let mut store = CatalogStore::new(FakeSource::default());
        store.fetch_all_products().await.unwrap();
        store.fetch_categories(true).await.unwrap();
        assert_eq!(store.categories().len(), 3);
        assert_eq!(store.display_categories().iter().map(|c| c.id).collect::<Vec<_>>(), vec![3, 9]);

        let sections = store.sections(&CatalogFilter::default());
        let titles: Vec<&str> = sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Coffee", "Other Products"]);

        let search = CatalogFilter { search: Some("LAT".into()), category_id: None };
        assert_eq!(store.filtered(&search).len(), 1);
    }
}
