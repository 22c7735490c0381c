//! SQLite-backed product store.
//!
//! ## Error Mapping
//!
//! | SQLx error | StoreError |
//! |------------|------------|
//! | Database (unique / check / not-null / foreign key) | `Constraint` |
//! | Everything else | `Backend` (the `sqlx::Error` itself) |
//!
//! An `UPDATE` or `DELETE` that matches no row is `StaleRecord`.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::error::ErrorKind;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, instrument};

use stockroom_core::Entity;
use stockroom_products::{Product, ProductId, ProductStore, StoreError};

use crate::db;

const COLUMNS: &str = "id, name, description, price, disabled, date_purchase, stock_quantity";

/// Product store over an SQLite connection pool.
///
/// Every call runs as its own implicit transaction, so a successful return
/// means the change is committed.
#[derive(Debug, Clone)]
pub struct SqliteProductStore {
    pool: SqlitePool,
}

impl SqliteProductStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn create_all(&self) -> anyhow::Result<()> {
        db::create_all(&self.pool).await
    }

    pub async fn drop_all(&self) -> anyhow::Result<()> {
        db::drop_all(&self.pool).await
    }

    pub async fn truncate(&self) -> anyhow::Result<u64> {
        db::truncate(&self.pool).await
    }

    /// Close the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    if let Some(db_err) = err.as_database_error() {
        if matches!(
            db_err.kind(),
            ErrorKind::UniqueViolation
                | ErrorKind::CheckViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::ForeignKeyViolation
        ) {
            debug!(operation, error = %db_err, "constraint violation");
            return StoreError::Constraint(db_err.message().to_string());
        }
    }
    StoreError::backend(err)
}

fn product_from_row(row: &SqliteRow) -> Result<Product, sqlx::Error> {
    let id: i64 = row.try_get("id")?;
    let mut product = Product::default().with_id(ProductId::new(id));
    product.name = row.try_get("name")?;
    product.description = row.try_get("description")?;
    product.price = row.try_get("price")?;
    product.disabled = row.try_get("disabled")?;
    product.date_purchase = Some(row.try_get::<NaiveDate, _>("date_purchase")?);
    product.stock_quantity = row.try_get("stock_quantity")?;
    Ok(product)
}

#[async_trait]
impl ProductStore for SqliteProductStore {
    #[instrument(skip_all, err)]
    async fn insert(&self, product: &Product) -> Result<Product, StoreError> {
        let sql = format!(
            "INSERT INTO product ({COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, COALESCE(?6, date('now')), ?7) \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(product.id().map(|id| id.get()))
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.price)
            .bind(product.disabled)
            .bind(product.date_purchase)
            .bind(product.stock_quantity)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert", e))?;

        let stored = product_from_row(&row).map_err(|e| map_sqlx_error("insert", e))?;
        debug!(id = ?stored.id(), "Inserted product");
        Ok(stored)
    }

    #[instrument(skip_all, fields(id = ?product.id()), err)]
    async fn update(&self, product: &Product) -> Result<(), StoreError> {
        let id = product.id().ok_or(StoreError::NotPersisted)?;
        let result = sqlx::query(
            r#"
            UPDATE product
            SET name = ?1,
                description = ?2,
                price = ?3,
                disabled = ?4,
                date_purchase = COALESCE(?5, date_purchase),
                stock_quantity = ?6
            WHERE id = ?7
            "#,
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.disabled)
        .bind(product.date_purchase)
        .bind(product.stock_quantity)
        .bind(id.get())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::stale("UPDATE", id));
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, id: ProductId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM product WHERE id = ?1")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::stale("DELETE", id));
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(&format!("SELECT {COLUMNS} FROM product"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list", e))?;

        rows.iter()
            .map(|row| product_from_row(row).map_err(|e| map_sqlx_error("list", e)))
            .collect()
    }

    #[instrument(skip(self), err)]
    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM product WHERE id = ?1"))
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get", e))?;

        row.as_ref()
            .map(product_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("get", e))
    }
}
