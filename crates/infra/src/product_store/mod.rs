//! `ProductStore` implementations.

pub mod in_memory;
pub mod sqlite;

pub use in_memory::InMemoryProductStore;
pub use sqlite::SqliteProductStore;
