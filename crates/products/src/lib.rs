//! Products domain module.
//!
//! This crate contains the `Product` entity, its dictionary form and its
//! CRUD lifecycle. Storage is reached only through the [`ProductStore`] port;
//! concrete stores live in `stockroom-infra`.

pub mod error;
#[cfg(feature = "fake")]
pub mod factory;
pub mod product;
pub mod store;

pub use error::ProductError;
#[cfg(feature = "fake")]
pub use factory::ProductFactory;
pub use product::{Product, ProductId, fields};
pub use store::{ProductStore, StoreError};
