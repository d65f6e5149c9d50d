//! Catalog reads for the storefront and product/category administration.

use chrono::Utc;
use rand::seq::SliceRandom;
use serde::Serialize;
use std::sync::Arc;
use validator::Validate;

use crate::domain::aggregates::{Category, CategoryDraft, ProductDraft, ProductQuery, ProductStatus, ProductWithCategories};
use crate::domain::catalog::FEATURED_CATEGORY_IDS;
use crate::domain::value_objects::{Page, PageRequest};
use crate::repository::CatalogRepository;
use crate::{Result, StorefrontError};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub products: u64,
    pub categories: u64,
    pub orders: u64,
}

#[derive(Clone)]
pub struct CatalogService {
    repo: Arc<dyn CatalogRepository>,
}

impl CatalogService {
    pub fn new(repo: Arc<dyn CatalogRepository>) -> Self { Self { repo } }

    // ---- storefront ----

    pub async fn public_products(&self) -> Result<Vec<ProductWithCategories>> { self.repo.list_public_products().await }

    /// Paged listing restricted to public products.
    pub async fn public_page(&self, query: ProductQuery, page: PageRequest) -> Result<Page<ProductWithCategories>> {
        let query = ProductQuery { status: Some(ProductStatus::Public), ..query };
        self.repo.list_products(&query, page).await
    }

    /// Drafts are reported as missing.
    pub async fn public_product(&self, id: i64) -> Result<ProductWithCategories> {
        self.repo
            .find_product(id)
            .await?
            .filter(|p| p.product.is_public())
            .ok_or(StorefrontError::NotFound("Product not found"))
    }

    /// One random public product with an image from each featured category
    /// that has one. A product is never picked twice.
    pub async fn featured_picks(&self) -> Result<Vec<ProductWithCategories>> {
        let products = self.repo.list_public_products().await?;
        let mut rng = rand::thread_rng();
        let mut picks: Vec<ProductWithCategories> = Vec::new();
        for &category_id in FEATURED_CATEGORY_IDS {
            let candidates: Vec<&ProductWithCategories> = products
                .iter()
                .filter(|p| p.in_category(category_id))
                .filter(|p| p.product.image.as_deref().is_some_and(|i| !i.is_empty()))
                .filter(|p| !picks.iter().any(|picked| picked.id() == p.id()))
                .collect();
            if let Some(pick) = candidates.choose(&mut rng) {
                picks.push((*pick).clone());
            }
        }
        Ok(picks)
    }

    pub async fn categories(&self) -> Result<Vec<Category>> { self.repo.list_categories().await }

    pub async fn category(&self, id: i64) -> Result<Category> {
        self.repo.find_category(id).await?.ok_or(StorefrontError::NotFound("Category not found"))
    }

    // ---- administration ----

    pub async fn list_products(&self, query: &ProductQuery, page: PageRequest) -> Result<Page<ProductWithCategories>> {
        self.repo.list_products(query, page).await
    }

    pub async fn product(&self, id: i64) -> Result<ProductWithCategories> {
        self.repo.find_product(id).await?.ok_or(StorefrontError::NotFound("Product not found"))
    }

    pub async fn create_product(&self, draft: ProductDraft) -> Result<ProductWithCategories> {
        let draft = self.checked(draft).await?;
        let product = self.repo.insert_product(&draft, Utc::now()).await?;
        tracing::info!(product_id = product.id(), name = %product.product.name, "product created");
        Ok(product)
    }

    pub async fn update_product(&self, id: i64, draft: ProductDraft) -> Result<ProductWithCategories> {
        let draft = self.checked(draft).await?;
        let product = self
            .repo
            .update_product(id, &draft, Utc::now())
            .await?
            .ok_or(StorefrontError::NotFound("Product not found"))?;
        tracing::info!(product_id = id, "product updated");
        Ok(product)
    }

    pub async fn delete_product(&self, id: i64) -> Result<()> {
        if !self.repo.delete_product(id).await? {
            return Err(StorefrontError::NotFound("Product not found"));
        }
        tracing::info!(product_id = id, "product deleted");
        Ok(())
    }

    pub async fn create_category(&self, draft: CategoryDraft) -> Result<Category> {
        let name = Self::category_name(draft)?;
        let category = self.repo.insert_category(&name, Utc::now()).await?;
        tracing::info!(category_id = category.id, name = %category.name, "category created");
        Ok(category)
    }

    pub async fn update_category(&self, id: i64, draft: CategoryDraft) -> Result<Category> {
        let name = Self::category_name(draft)?;
        self.repo
            .update_category(id, &name, Utc::now())
            .await?
            .ok_or(StorefrontError::NotFound("Category not found"))
    }

    pub async fn delete_category(&self, id: i64) -> Result<()> {
        if !self.repo.delete_category(id).await? {
            return Err(StorefrontError::NotFound("Category not found"));
        }
        tracing::info!(category_id = id, "category deleted");
        Ok(())
    }

    pub async fn counts(&self, orders: u64) -> Result<Counts> {
        Ok(Counts { products: self.repo.count_products().await?, categories: self.repo.count_categories().await?, orders })
    }

    fn category_name(draft: CategoryDraft) -> Result<String> {
        let draft = CategoryDraft { name: draft.name.trim().to_string() };
        draft.validate().map_err(|e| StorefrontError::from_validation("Invalid data", e))?;
        Ok(draft.name)
    }

    /// Validates the payload and that every referenced category exists.
    async fn checked(&self, mut draft: ProductDraft) -> Result<ProductDraft> {
        draft.name = draft.name.trim().to_string();
        draft.validate().map_err(|e| StorefrontError::from_validation("Invalid data", e))?;

        if let Some(ids) = draft.category_ids.as_mut() {
            ids.sort_unstable();
            ids.dedup();
            let known = self.repo.list_categories().await?;
            let unknown: Vec<String> =
                ids.iter().filter(|id| !known.iter().any(|c| c.id == **id)).map(|id| id.to_string()).collect();
            if !unknown.is_empty() {
                let mut errors = crate::FieldErrors::new();
                errors.insert("categoryIds".into(), vec![format!("Unknown category: {}", unknown.join(", "))]);
                return Err(StorefrontError::Validation { message: "Invalid data".into(), errors });
            }
        }
        Ok(draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryStore;

    async fn setup() -> (CatalogService, Vec<Category>) {
        let service = CatalogService::new(Arc::new(MemoryStore::new()));
        let mut categories = Vec::new();
        for name in ["Coffee", "Tea", "Flowers"] {
            categories.push(service.create_category(CategoryDraft { name: name.into() }).await.unwrap());
        }
        (service, categories)
    }

    fn draft(name: &str, status: ProductStatus, categories: Vec<i64>) -> ProductDraft {
        ProductDraft {
            name: name.into(),
            price: 45_000,
            status,
            image: Some("/uploads/a.png".into()),
            category_ids: Some(categories),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_payloads() {
        let (service, _) = setup().await;
        let err = service.create_product(ProductDraft { name: "  ".into(), price: 10, ..Default::default() }).await.unwrap_err();
        assert!(matches!(err, StorefrontError::Validation { ref errors, .. } if errors.contains_key("name")));

        let err = service.create_product(draft("Latte", ProductStatus::Public, vec![999])).await.unwrap_err();
        assert!(matches!(err, StorefrontError::Validation { ref errors, .. } if errors.contains_key("categoryIds")));
    }

    #[tokio::test]
    async fn test_drafts_are_hidden_from_the_storefront() {
        let (service, cats) = setup().await;
        let public = service.create_product(draft("Latte", ProductStatus::Public, vec![cats[0].id])).await.unwrap();
        let hidden = service.create_product(draft("Secret blend", ProductStatus::Draft, vec![cats[0].id])).await.unwrap();

        assert_eq!(service.public_product(public.id()).await.unwrap().id(), public.id());
        assert!(matches!(service.public_product(hidden.id()).await, Err(StorefrontError::NotFound(_))));
        assert_eq!(service.public_products().await.unwrap().len(), 1);

        let page = service.public_page(ProductQuery::default(), PageRequest::default()).await.unwrap();
        assert_eq!(page.pagination.total_items, 1);
        let all = service.list_products(&ProductQuery::default(), PageRequest::default()).await.unwrap();
        assert_eq!(all.pagination.total_items, 2);
    }

    #[tokio::test]
    async fn test_update_and_delete_report_missing_rows() {
        let (service, cats) = setup().await;
        assert!(matches!(
            service.update_product(42, draft("Latte", ProductStatus::Public, vec![])).await,
            Err(StorefrontError::NotFound("Product not found"))
        ));
        assert!(matches!(service.delete_product(42).await, Err(StorefrontError::NotFound(_))));
        service.delete_category(cats[1].id).await.unwrap();
        assert!(matches!(service.category(cats[1].id).await, Err(StorefrontError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_counts() {
        let (service, cats) = setup().await;
        service.create_product(draft("Latte", ProductStatus::Draft, vec![cats[0].id])).await.unwrap();
        assert_eq!(service.counts(5).await.unwrap(), Counts { products: 1, categories: 3, orders: 5 });
    }

    #[tokio::test]
    async fn test_featured_picks_need_an_image() {
        let store = Arc::new(MemoryStore::new());
        let service = CatalogService::new(store.clone());
        // Category ids are assigned in insertion order, so ids 1..=9 exist.
        for i in 1..=9 {
            service.create_category(CategoryDraft { name: format!("Category {i}") }).await.unwrap();
        }
        service.create_product(draft("Latte", ProductStatus::Public, vec![3])).await.unwrap();
        service.create_product(ProductDraft { image: None, ..draft("Plain tea", ProductStatus::Public, vec![9]) }).await.unwrap();
        service.create_product(draft("Hidden", ProductStatus::Draft, vec![7])).await.unwrap();
        service.create_product(draft("Rose", ProductStatus::Public, vec![3, 4])).await.unwrap();

        let picks = service.featured_picks().await.unwrap();
        let names: Vec<&str> = picks.iter().map(|p| p.product.name.as_str()).collect();
        assert!(!names.contains(&"Plain tea"));
        assert!(!names.contains(&"Hidden"));
        assert!(names.contains(&"Rose"));
        assert!((1..=2).contains(&picks.len()));
    }
}
