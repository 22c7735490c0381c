//! JSON fixtures: an array of product objects used to seed known data.

use std::path::Path;

use anyhow::Context;
use stockroom_core::Record;
use stockroom_products::Product;

/// Read a fixture file into raw records.
pub fn load_fixture(path: impl AsRef<Path>) -> anyhow::Result<Vec<Record>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read fixture {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("fixture {} is not a JSON array of objects", path.display()))
}

/// Read a fixture file into unsaved products.
pub fn load_products(path: impl AsRef<Path>) -> anyhow::Result<Vec<Product>> {
    let path = path.as_ref();
    load_fixture(path)?
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            Product::from_dict(record)
                .with_context(|| format!("fixture {} entry {idx}", path.display()))
        })
        .collect()
}
