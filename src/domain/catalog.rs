//! Storefront catalog views: search/category filtering and the category
//! sections shown on the products page.

use serde::{Deserialize, Serialize};

use crate::domain::aggregates::{Category, ProductWithCategories};

/// Category ids hidden from the storefront.
pub const EXCLUDED_CATEGORY_IDS: &[i64] = &[1, 2];

/// Display order of storefront sections, by category id.
pub const RANKED_CATEGORY_IDS: &[i64] = &[3, 9, 7, 4, 8, 5, 6];

/// Categories the home page draws one random product from.
pub const FEATURED_CATEGORY_IDS: &[i64] = &[3, 9, 7, 4, 8];

pub const OTHER_PRODUCTS_TITLE: &str = "Other Products";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogFilter {
    pub search: Option<String>,
    pub category_id: Option<i64>,
}

impl CatalogFilter {
    pub fn matches(&self, product: &ProductWithCategories) -> bool {
        let in_category = self.category_id.map_or(true, |id| product.in_category(id));
        in_category && self.matches_search(product)
    }

    fn matches_search(&self, product: &ProductWithCategories) -> bool {
        let needle = match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => s.to_lowercase(),
            None => return true,
        };
        let p = &product.product;
        std::iter::once(Some(p.name.as_str()))
            .chain([p.subtitle.as_deref(), p.description.as_deref()])
            .flatten()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

pub fn filter_products(products: &[ProductWithCategories], filter: &CatalogFilter) -> Vec<ProductWithCategories> {
    products.iter().filter(|p| filter.matches(p)).cloned().collect()
}

/// Which categories the storefront shows and in what order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayPolicy {
    pub excluded: Vec<i64>,
    pub ranked: Vec<i64>,
}

impl Default for DisplayPolicy {
    fn default() -> Self {
        Self { excluded: EXCLUDED_CATEGORY_IDS.to_vec(), ranked: RANKED_CATEGORY_IDS.to_vec() }
    }
}

impl DisplayPolicy {
    fn rank(&self, category_id: i64) -> usize {
        self.ranked.iter().position(|&id| id == category_id).unwrap_or(usize::MAX)
    }

    /// Drops excluded categories and orders the rest by rank. Unranked
    /// categories follow in their incoming order.
    pub fn display_categories(&self, categories: &[Category]) -> Vec<Category> {
        let mut shown: Vec<Category> = categories.iter().filter(|c| !self.excluded.contains(&c.id)).cloned().collect();
        shown.sort_by_key(|c| self.rank(c.id));
        shown
    }

    /// Groups products under the first displayed category they belong to. A
    /// product never appears twice; products in no displayed category land in
    /// a trailing "Other Products" section. Empty sections are omitted.
    pub fn build_sections(&self, products: &[ProductWithCategories], categories: &[Category]) -> Vec<ProductSection> {
        let shown = self.display_categories(categories);
        let mut sections: Vec<ProductSection> = shown
            .iter()
            .map(|c| ProductSection { title: c.name.clone(), category: Some(c.clone()), products: Vec::new() })
            .collect();
        let mut other = Vec::new();

        for product in products {
            match shown.iter().position(|c| product.in_category(c.id)) {
                Some(idx) => sections[idx].products.push(product.clone()),
                None => other.push(product.clone()),
            }
        }

        sections.retain(|s| !s.products.is_empty());
        if !other.is_empty() {
            sections.push(ProductSection { title: OTHER_PRODUCTS_TITLE.to_string(), category: None, products: other });
        }
        sections
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSection {
    pub title: String,
    /// `None` for the "Other Products" bucket.
    pub category: Option<Category>,
    pub products: Vec<ProductWithCategories>,
}
