//! HTTP surface: storefront reads, checkout and the back-office.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Json, Router,
};
use std::path::Path;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::config::AdminConfig;
use crate::service::{CatalogService, OrderService};
use crate::storage::ImageStore;

pub mod admin;
pub mod auth;
pub mod categories;
pub mod extract;
pub mod orders;
pub mod products;
pub mod response;
pub mod upload;

#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
    pub orders: OrderService,
    pub images: Arc<dyn ImageStore>,
    pub admin: Arc<AdminConfig>,
}

pub fn router(state: AppState, upload_dir: &Path) -> Router {
    let admin = Router::new()
        .route("/counts", get(admin::counts))
        .route("/products", get(admin::list_products).post(admin::create_product))
        .route("/products/:id", get(admin::get_product).put(admin::update_product).delete(admin::delete_product))
        .route("/categories", get(admin::list_categories).post(admin::create_category))
        .route("/categories/:id", get(admin::get_category).put(admin::update_category).delete(admin::delete_category))
        .route("/orders", get(admin::list_orders).patch(admin::update_order_status))
        .route("/upload", post(upload::upload_image).layer(DefaultBodyLimit::max(upload::UPLOAD_BODY_LIMIT)))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_admin))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout));

    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "storefront"})) }))
        .route("/api/products", get(products::list))
        .route("/api/products/all", get(products::list_all))
        .route("/api/products/random", get(products::random))
        .route("/api/products/:id", get(products::get))
        .route("/api/categories", get(categories::list))
        .route("/api/categories/:id", get(categories::get))
        .route("/api/orders", post(orders::place).patch(orders::confirm_payment))
        .nest("/api/admin", admin)
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
