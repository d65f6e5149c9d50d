//! Cart Aggregate

use serde::{Deserialize, Serialize};

/// One cart line. `price` is captured when the product is added and is not
/// refreshed from the catalog afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: i64,
    pub name: String,
    pub price: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub quantity: i64,
    #[serde(default)]
    pub note: String,
}

impl CartItem {
    pub fn line_total(&self) -> i64 { self.price.saturating_mul(self.quantity) }
}

/// What the cart needs to know about a product being added.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CartProduct {
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub image: Option<String>,
}

impl From<&super::ProductWithCategories> for CartProduct {
    fn from(p: &super::ProductWithCategories) -> Self {
        Self { id: p.product.id, name: p.product.name.clone(), price: p.product.price, image: p.product.image.clone() }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub name: String,
    pub phone1: String,
    #[serde(default)]
    pub phone2: String,
    pub address: String,
}

/// Partial update of [`UserInfo`]; `None` fields are kept.
#[derive(Clone, Debug, Default)]
pub struct UserInfoPatch {
    pub name: Option<String>,
    pub phone1: Option<String>,
    pub phone2: Option<String>,
    pub address: Option<String>,
}

impl UserInfo {
    pub fn update(&mut self, patch: UserInfoPatch) {
        if let Some(v) = patch.name { self.name = v; }
        if let Some(v) = patch.phone1 { self.phone1 = v; }
        if let Some(v) = patch.phone2 { self.phone2 = v; }
        if let Some(v) = patch.address { self.address = v; }
    }

    /// Name, primary phone and address are all present.
    pub fn is_complete(&self) -> bool {
        [&self.name, &self.phone1, &self.address].iter().all(|f| !f.trim().is_empty())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    items: Vec<CartItem>,
    user_info: UserInfo,
}

impl Cart {
    pub fn new() -> Self { Self::default() }

    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn user_info(&self) -> &UserInfo { &self.user_info }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    /// Adds to an existing line for the same product or appends a new one.
    /// An existing line takes the summed quantity and the new note. Lines never
    /// hold less than one: a sum of zero or less drops the line, and a new line
    /// with a non-positive quantity is not added.
    pub fn add_item(&mut self, product: CartProduct, quantity: i64, note: impl Into<String>) {
        let note = note.into();
        if let Some(existing) = self.items.iter_mut().find(|i| i.id == product.id) {
            let quantity = existing.quantity.saturating_add(quantity);
            if quantity <= 0 {
                self.remove_item(product.id);
                return;
            }
            existing.quantity = quantity;
            existing.note = note;
        } else if quantity > 0 {
            self.items.push(CartItem { id: product.id, name: product.name, price: product.price, image: product.image, quantity, note });
        }
    }

    /// A quantity of zero or less removes the line. Unknown ids are ignored.
    pub fn update_quantity(&mut self, id: i64, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(id);
            return;
        }
        if let Some(item) = self.items.iter_mut().find(|i| i.id == id) { item.quantity = quantity; }
    }

    pub fn update_note(&mut self, id: i64, note: impl Into<String>) {
        if let Some(item) = self.items.iter_mut().find(|i| i.id == id) { item.note = note.into(); }
    }

    pub fn remove_item(&mut self, id: i64) { self.items.retain(|i| i.id != id); }

    pub fn clear(&mut self) { self.items.clear(); }

    pub fn update_user_info(&mut self, patch: UserInfoPatch) { self.user_info.update(patch); }

    pub fn total_items(&self) -> i64 { self.items.iter().map(|i| i.quantity).fold(0, i64::saturating_add) }

    pub fn total_price(&self) -> i64 { self.items.iter().map(CartItem::line_total).fold(0, i64::saturating_add) }
}
