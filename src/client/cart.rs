//! Cart persistence between sessions.

use std::path::PathBuf;
use std::sync::Mutex;

use super::ClientError;
use crate::domain::aggregates::{Cart, CartProduct, UserInfoPatch};

pub trait CartStorage: Send + Sync {
    /// `None` when nothing has been saved yet.
    fn load(&self) -> Result<Option<Cart>, ClientError>;
    fn save(&self, cart: &Cart) -> Result<(), ClientError>;
}

/// `{ "items": [...], "userInfo": {...} }` in a single JSON file.
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }
}

impl CartStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<Cart>, ClientError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, cart: &Cart) -> Result<(), ClientError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&self.path, serde_json::to_vec_pretty(cart)?)?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    saved: Mutex<Option<Cart>>,
}

impl CartStorage for MemoryStorage {
    fn load(&self) -> Result<Option<Cart>, ClientError> {
        Ok(self.saved.lock().map(|c| c.clone()).unwrap_or_default())
    }

    fn save(&self, cart: &Cart) -> Result<(), ClientError> {
        if let Ok(mut saved) = self.saved.lock() {
            *saved = Some(cart.clone());
        }
        Ok(())
    }
}

/// The shopper's cart, saved after every change.
pub struct CartStore<S> {
    cart: Cart,
    storage: S,
}

impl<S: CartStorage> CartStore<S> {
    /// Restores the saved cart. Unreadable data starts an empty cart.
    pub fn open(storage: S) -> Self {
        let cart = match storage.load() {
            Ok(saved) => saved.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable saved cart");
                Cart::default()
            }
        };
        Self { cart, storage }
    }

    pub fn cart(&self) -> &Cart { &self.cart }

    fn mutate(&mut self, change: impl FnOnce(&mut Cart)) -> Result<(), ClientError> {
        change(&mut self.cart);
        self.storage.save(&self.cart)
    }

    pub fn add_item(&mut self, product: CartProduct, quantity: i64, note: &str) -> Result<(), ClientError> {
        self.mutate(|c| c.add_item(product, quantity, note))
    }

    pub fn update_quantity(&mut self, id: i64, quantity: i64) -> Result<(), ClientError> {
        self.mutate(|c| c.update_quantity(id, quantity))
    }

    pub fn update_note(&mut self, id: i64, note: &str) -> Result<(), ClientError> { self.mutate(|c| c.update_note(id, note)) }

    pub fn remove_item(&mut self, id: i64) -> Result<(), ClientError> { self.mutate(|c| c.remove_item(id)) }

    pub fn clear(&mut self) -> Result<(), ClientError> { self.mutate(Cart::clear) }

    pub fn update_user_info(&mut self, patch: UserInfoPatch) -> Result<(), ClientError> {
        self.mutate(|c| c.update_user_info(patch))
    }
}
