use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use stockroom_core::Entity;
use stockroom_products::product::TEXT_MAX_LEN;
use stockroom_products::{Product, ProductId, ProductStore, StoreError};

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<ProductId, Product>,
    last_id: i64,
}

/// In-memory product table.
///
/// Intended for tests/dev. Enforces the same constraints as the SQLite schema
/// (text length, unique id) so both stores fail the same way.
#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    table: RwLock<Table>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every row. Ids keep counting from where they were.
    pub fn clear(&self) -> Result<(), StoreError> {
        let mut table = self.table.write().map_err(|_| poisoned())?;
        table.rows.clear();
        Ok(())
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        let table = self.table.read().map_err(|_| poisoned())?;
        Ok(table.rows.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("product table lock poisoned".into())
}

fn check_text(column: &str, value: &Option<String>) -> Result<(), StoreError> {
    match value {
        Some(text) if text.chars().count() > TEXT_MAX_LEN => Err(StoreError::Constraint(format!(
            "CHECK constraint failed: length({column}) <= {TEXT_MAX_LEN}"
        ))),
        _ => Ok(()),
    }
}

fn check_row(product: &Product) -> Result<(), StoreError> {
    check_text("name", &product.name)?;
    check_text("description", &product.description)
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn insert(&self, product: &Product) -> Result<Product, StoreError> {
        check_row(product)?;
        let mut table = self.table.write().map_err(|_| poisoned())?;

        let id = match product.id() {
            Some(id) if table.rows.contains_key(&id) => {
                return Err(StoreError::Constraint(
                    "UNIQUE constraint failed: product.id".to_string(),
                ));
            }
            Some(id) => id,
            None => table
                .last_id
                .checked_add(1)
                .map(ProductId::new)
                .ok_or_else(|| StoreError::Backend("product id sequence exhausted".into()))?,
        };
        table.last_id = table.last_id.max(id.get());

        let mut stored = product.clone().with_id(id);
        if stored.date_purchase.is_none() {
            stored.date_purchase = Some(Utc::now().date_naive());
        }
        table.rows.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, product: &Product) -> Result<(), StoreError> {
        let id = product.id().ok_or(StoreError::NotPersisted)?;
        check_row(product)?;
        let mut table = self.table.write().map_err(|_| poisoned())?;

        let row = table
            .rows
            .get_mut(&id)
            .ok_or_else(|| StoreError::stale("UPDATE", id))?;
        let mut next = product.clone();
        next.date_purchase = product.date_purchase.or(row.date_purchase);
        *row = next;
        Ok(())
    }

    async fn delete(&self, id: ProductId) -> Result<(), StoreError> {
        let mut table = self.table.write().map_err(|_| poisoned())?;
        table
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::stale("DELETE", id))
    }

    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        let table = self.table.read().map_err(|_| poisoned())?;
        Ok(table.rows.values().cloned().collect())
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let table = self.table.read().map_err(|_| poisoned())?;
        Ok(table.rows.get(&id).cloned())
    }
}
