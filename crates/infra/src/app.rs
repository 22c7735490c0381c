//! Application factory: binds the process to its store.

use tracing::info;

use crate::config::StoreConfig;
use crate::db;
use crate::product_store::SqliteProductStore;

/// Everything a caller needs to serve product requests.
///
/// Pass `store` explicitly to the `Product` CRUD methods; there is no global
/// handle.
#[derive(Debug, Clone)]
pub struct App {
    pub config: StoreConfig,
    pub store: SqliteProductStore,
}

impl App {
    /// Release the store's connections.
    pub async fn shutdown(self) {
        self.store.close().await;
        info!("Store closed");
    }
}

/// Open the configured store and make sure the product table exists.
pub async fn create_app(config: StoreConfig) -> anyhow::Result<App> {
    let pool = db::connect(&config).await?;
    db::create_all(&pool).await?;
    info!(
        database_url = %config.database_url,
        max_connections = config.max_connections,
        "Store initialized"
    );

    Ok(App {
        config,
        store: SqliteProductStore::new(pool),
    })
}
