//! Storefront - café and flower-shop storefront service

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront::api::{self, AppState};
use storefront::config::Config;
use storefront::notify::{Notifier, ShopAccount};
use storefront::repository::{CatalogRepository, MemoryStore, OrderRepository, PgStore};
use storefront::service::{CatalogService, OrderService};
use storefront::storage::LocalImageStore;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| config.rust_log.clone().into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    for warning in &config.warnings {
        tracing::warn!("{warning}");
    }

    let (catalog_repo, order_repo): (Arc<dyn CatalogRepository>, Arc<dyn OrderRepository>) = match &config.database_url {
        Some(url) => {
            let db = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(url)
                .await
                .context("connecting to DATABASE_URL")?;
            sqlx::migrate!("./migrations").run(&db).await?;
            let store = Arc::new(PgStore::new(db));
            (store.clone() as Arc<dyn CatalogRepository>, store as Arc<dyn OrderRepository>)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using the in-memory store, data is lost on restart");
            let store = Arc::new(MemoryStore::new());
            (store.clone() as Arc<dyn CatalogRepository>, store as Arc<dyn OrderRepository>)
        }
    };

    let shop = ShopAccount { bank_name: config.payment.bank_name.clone(), bank_account: config.payment.bank_account.clone() };
    let notifier = Notifier::from_config(&config.notifications, shop).await;

    let state = AppState {
        catalog: CatalogService::new(catalog_repo),
        orders: OrderService::new(order_repo, notifier, config.payment.clone()),
        images: Arc::new(LocalImageStore::new(&config.upload_dir, config.public_base_url.clone())),
        admin: Arc::new(config.admin.clone()),
    };
    let app = api::router(state, &config.upload_dir);

    tracing::info!("🚀 Storefront listening on 0.0.0.0:{}", config.port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?, app).await?;
    Ok(())
}
