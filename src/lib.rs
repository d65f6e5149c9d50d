//! Storefront
//!
//! Self-hosted storefront for a café and flower shop.
//!
//! ## Features
//! - Public product catalog with search, category filter and display sections
//! - Client-side shopping cart with persisted customer profile
//! - Checkout wizard ending in a bank-transfer QR code
//! - Order back-office with status management
//! - Product and category administration
//! - Multi-channel order notifications

use std::collections::BTreeMap;
use thiserror::Error;

pub mod api;
pub mod client;
pub mod config;
pub mod domain;
pub mod notify;
pub mod repository;
pub mod service;
pub mod storage;

// =============================================================================
// Error Types
// =============================================================================

/// Field name to the list of messages attached to it.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("{message}")]
    Validation { message: String, errors: FieldErrors },

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl StorefrontError {
    /// A validation failure without field-level detail.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into(), errors: FieldErrors::new() }
    }

    /// Wraps `validator` output under a summary message.
    pub fn from_validation(message: impl Into<String>, errors: validator::ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        for (field, errs) in errors.field_errors() {
            let messages = errs
                .iter()
                .map(|e| e.message.as_ref().map(|m| m.to_string()).unwrap_or_else(|| e.code.to_string()))
                .collect();
            fields.insert(field.to_string(), messages);
        }
        Self::Validation { message: message.into(), errors: fields }
    }
}

pub type Result<T> = std::result::Result<T, StorefrontError>;
