//! Storage boundary for products.
//!
//! This module defines the infrastructure-facing abstraction the `Product`
//! lifecycle talks to, without making any storage assumptions. Every call is
//! its own unit of work: a successful return means the change is committed.

use std::error::Error as StdError;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::product::{Product, ProductId};

/// Store operation error.
///
/// These are **infrastructure errors** as opposed to data validation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The instance has never been written to the store.
    #[error("product instance is not persisted")]
    NotPersisted,

    /// The row an instance refers to no longer exists.
    #[error("{operation} on table 'product' expected to match 1 row; 0 were matched (id {id})")]
    StaleRecord {
        operation: &'static str,
        id: ProductId,
    },

    /// A schema constraint rejected the write (length, uniqueness, not-null).
    #[error("constraint violated: {0}")]
    Constraint(String),

    /// Any other backend failure, passed through as-is.
    #[error(transparent)]
    Backend(Box<dyn StdError + Send + Sync + 'static>),
}

impl StoreError {
    pub fn backend(err: impl StdError + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(err))
    }

    pub fn stale(operation: &'static str, id: ProductId) -> Self {
        Self::StaleRecord { operation, id }
    }

    /// Borrow the backend error as its concrete type, if it is one.
    pub fn downcast_backend<E: StdError + 'static>(&self) -> Option<&E> {
        match self {
            Self::Backend(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }
}

/// Product persistence port.
///
/// Implementations assign identifiers on insert and fill in store-side
/// defaults (the purchase date). `list` makes no ordering promise.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Write a new row and return it as stored (with its id and defaults).
    async fn insert(&self, product: &Product) -> Result<Product, StoreError>;

    /// Overwrite the row identified by `product`'s id with its current fields.
    async fn update(&self, product: &Product) -> Result<(), StoreError>;

    async fn delete(&self, id: ProductId) -> Result<(), StoreError>;

    async fn list(&self) -> Result<Vec<Product>, StoreError>;

    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError>;
}

#[async_trait]
impl<S> ProductStore for Arc<S>
where
    S: ProductStore + ?Sized,
{
    async fn insert(&self, product: &Product) -> Result<Product, StoreError> {
        (**self).insert(product).await
    }

    async fn update(&self, product: &Product) -> Result<(), StoreError> {
        (**self).update(product).await
    }

    async fn delete(&self, id: ProductId) -> Result<(), StoreError> {
        (**self).delete(id).await
    }

    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        (**self).list().await
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        (**self).get(id).await
    }
}
