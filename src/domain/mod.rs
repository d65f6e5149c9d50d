//! Storefront domain: aggregates, value objects, catalog policy and events
pub mod aggregates;
pub mod catalog;
pub mod events;
pub mod value_objects;
