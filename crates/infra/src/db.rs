//! Database adapters: connection pool and schema management.
//!
//! Schema management covers creating, dropping and emptying the product
//! table. There is no migration tooling.

use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::{debug, info};

use crate::config::StoreConfig;

const CREATE_PRODUCT_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS product (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    name           VARCHAR(64) CHECK (name IS NULL OR length(name) <= 64),
    description    VARCHAR(64) CHECK (description IS NULL OR length(description) <= 64),
    price          REAL NULL,
    disabled       BOOLEAN NOT NULL DEFAULT 0,
    date_purchase  DATE NOT NULL DEFAULT (date('now')),
    stock_quantity INTEGER NOT NULL
)
"#;

/// Open a connection pool for `config`.
///
/// File databases are created if missing. In-memory databases keep their
/// single connection alive for the life of the pool.
pub async fn connect(config: &StoreConfig) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.database_url)
        .with_context(|| format!("invalid database url {:?}", config.database_url))?
        .create_if_missing(true);

    let mut pool_options = SqlitePoolOptions::new().max_connections(config.max_connections);
    if config.is_in_memory() {
        pool_options = pool_options
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>);
    }

    let pool = pool_options
        .connect_with(options)
        .await
        .with_context(|| format!("failed to open SQLite pool at {:?}", config.database_url))?;

    debug!(max_connections = config.max_connections, "SQLite pool opened");
    Ok(pool)
}

/// Create the product table if it does not exist.
pub async fn create_all(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(CREATE_PRODUCT_TABLE)
        .execute(pool)
        .await
        .context("failed to create product table")?;
    Ok(())
}

/// Drop the product table and everything in it.
pub async fn drop_all(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query("DROP TABLE IF EXISTS product")
        .execute(pool)
        .await
        .context("failed to drop product table")?;
    info!("Dropped product table");
    Ok(())
}

/// Delete every product row, keeping the table.
pub async fn truncate(pool: &SqlitePool) -> anyhow::Result<u64> {
    let result = sqlx::query("DELETE FROM product")
        .execute(pool)
        .await
        .context("failed to truncate product table")?;
    debug!(rows = result.rows_affected(), "Truncated product table");
    Ok(result.rows_affected())
}
