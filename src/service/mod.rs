//! Application services. Handlers call these; these call the repositories
//! and the notifier.

pub mod catalog;
pub mod order;

pub use catalog::{CatalogService, Counts};
pub use order::{OrderService, PlacedOrder};
