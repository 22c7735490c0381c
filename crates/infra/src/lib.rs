//! Infrastructure layer: store binding, configuration, fixtures.

pub mod app;
pub mod config;
pub mod db;
pub mod fixtures;
pub mod product_store;

pub use app::{App, create_app};
pub use config::StoreConfig;
pub use product_store::{InMemoryProductStore, SqliteProductStore};
