use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument};

use stockroom_core::{DataValidationError, DomainResult, Entity, Record};

use crate::error::ProductError;
use crate::store::{ProductStore, StoreError};

/// Attribute names, as used in the dictionary form and as column names.
pub mod fields {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const DESCRIPTION: &str = "description";
    pub const PRICE: &str = "price";
    pub const DISABLED: &str = "disabled";
    pub const DATE_PURCHASE: &str = "date_purchase";
    pub const STOCK_QUANTITY: &str = "stock_quantity";

    /// Every attribute, in column order.
    pub const ALL: [&str; 7] = [
        ID,
        NAME,
        DESCRIPTION,
        PRICE,
        DISABLED,
        DATE_PURCHASE,
        STOCK_QUANTITY,
    ];
}

/// Maximum length of `name` and `description`, enforced by stores.
pub const TEXT_MAX_LEN: usize = 64;

/// Product identifier, assigned by the store.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(i64);

impl ProductId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<i64> for ProductId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// A product record.
///
/// Instances are plain values owned by the caller. The store owns the durable
/// copy; two instances with the same id are independent and never synchronized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Product {
    pub(crate) id: Option<ProductId>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub disabled: bool,
    /// Left unset, the store fills in the current date on create.
    pub date_purchase: Option<NaiveDate>,
    pub stock_quantity: i32,
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> Option<ProductId> {
        self.id
    }
}

impl core::fmt::Display for Product {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "<Product '{name}'>"),
            None => f.write_str("<Product None>"),
        }
    }
}

impl Product {
    pub fn new(name: impl Into<String>, price: Option<f64>, stock_quantity: i32) -> Self {
        Self {
            name: Some(name.into()),
            price,
            stock_quantity,
            ..Self::default()
        }
    }

    /// Attach an identifier.
    ///
    /// Used by stores when materializing rows, and by fixtures that insert
    /// with known ids. Application code gets ids from [`Product::create`].
    pub fn with_id(mut self, id: ProductId) -> Self {
        self.id = Some(id);
        self
    }

    /// Build a product from its dictionary form.
    pub fn from_dict(data: &Record) -> DomainResult<Self> {
        let mut product = Self::default();
        product.apply_dict(data)?;
        Ok(product)
    }

    /// Serialize the seven attributes, keyed by attribute name.
    ///
    /// Dates are `YYYY-MM-DD`; unset values are `null`. A non-finite price
    /// has no JSON number form and is written as `"inf"`, `"-inf"` or `"NaN"`.
    pub fn to_dict(&self) -> Record {
        let mut record = Record::new();
        record.insert(fields::ID.into(), self.id.map(|id| id.get()).into());
        record.insert(fields::NAME.into(), self.name.clone().into());
        record.insert(fields::DESCRIPTION.into(), self.description.clone().into());
        record.insert(fields::PRICE.into(), self.price.map(price_value).into());
        record.insert(fields::DISABLED.into(), self.disabled.into());
        record.insert(
            fields::DATE_PURCHASE.into(),
            self.date_purchase.map(|d| d.to_string()).into(),
        );
        record.insert(fields::STOCK_QUANTITY.into(), self.stock_quantity.into());
        record
    }

    /// Assign every attribute present in `data`; unknown keys are ignored.
    ///
    /// Values are not range checked. A value that cannot be held by the field
    /// (wrong JSON type, `null` for a required field, an unparseable date)
    /// fails the whole call and leaves `self` untouched.
    pub fn apply_dict(&mut self, data: &Record) -> DomainResult<()> {
        let mut next = self.clone();
        for (key, value) in data {
            match key.as_str() {
                fields::ID => {
                    next.id = optional(key, value, "an integer id", |v| {
                        v.as_i64().map(ProductId::new)
                    })?
                }
                fields::NAME => next.name = optional(key, value, "a string", as_string)?,
                fields::DESCRIPTION => {
                    next.description = optional(key, value, "a string", as_string)?
                }
                fields::PRICE => next.price = optional(key, value, "a number", as_price)?,
                fields::DISABLED => next.disabled = required(key, value, "a boolean", Value::as_bool)?,
                fields::DATE_PURCHASE => {
                    next.date_purchase = optional(key, value, "a YYYY-MM-DD date", as_date)?
                }
                fields::STOCK_QUANTITY => {
                    next.stock_quantity = required(key, value, "a 32-bit integer", |v| {
                        v.as_i64().and_then(|n| i32::try_from(n).ok())
                    })?
                }
                _ => {}
            }
        }
        *self = next;
        Ok(())
    }

    /// Persist a new record and take on the stored id and defaults.
    ///
    /// Not idempotent: each call on a fresh instance writes a new row.
    #[instrument(skip_all)]
    pub async fn create<S>(&mut self, store: &S) -> Result<(), ProductError>
    where
        S: ProductStore + ?Sized,
    {
        info!(name = ?self.name, "Creating product");
        let stored = store.insert(self).await?;
        *self = stored;
        Ok(())
    }

    /// Commit the current field values to the existing record.
    ///
    /// No concurrency check; the last writer wins.
    #[instrument(skip_all)]
    pub async fn update<S>(&self, store: &S) -> Result<(), ProductError>
    where
        S: ProductStore + ?Sized,
    {
        info!(name = ?self.name, "Saving product");
        if self.id.is_none() {
            return Err(DataValidationError::new("Update called with empty ID field").into());
        }
        store.update(self).await?;
        Ok(())
    }

    /// Remove the record. Consumes the instance.
    #[instrument(skip_all)]
    pub async fn delete<S>(self, store: &S) -> Result<(), ProductError>
    where
        S: ProductStore + ?Sized,
    {
        info!(name = ?self.name, "Deleting product");
        let id = self.id.ok_or(StoreError::NotPersisted)?;
        store.delete(id).await?;
        Ok(())
    }

    /// Every persisted product, in store order.
    #[instrument(skip_all)]
    pub async fn all<S>(store: &S) -> Result<Vec<Product>, ProductError>
    where
        S: ProductStore + ?Sized,
    {
        info!("Processing all products");
        Ok(store.list().await?)
    }

    #[instrument(skip(store))]
    pub async fn find<S>(store: &S, id: ProductId) -> Result<Option<Product>, ProductError>
    where
        S: ProductStore + ?Sized,
    {
        info!(%id, "Processing lookup");
        Ok(store.get(id).await?)
    }
}

fn optional<T>(
    field: &str,
    value: &Value,
    expected: &str,
    read: impl Fn(&Value) -> Option<T>,
) -> DomainResult<Option<T>> {
    if value.is_null() {
        return Ok(None);
    }
    read(value)
        .map(Some)
        .ok_or_else(|| DataValidationError::invalid_field(field, expected, value))
}

fn required<T>(
    field: &str,
    value: &Value,
    expected: &str,
    read: impl Fn(&Value) -> Option<T>,
) -> DomainResult<T> {
    read(value).ok_or_else(|| DataValidationError::invalid_field(field, expected, value))
}

fn as_string(value: &Value) -> Option<String> {
    value.as_str().map(str::to_owned)
}

fn price_value(price: f64) -> Value {
    if price.is_finite() {
        price.into()
    } else {
        Value::String(price.to_string())
    }
}

/// Numbers as-is; strings only for the non-finite values `to_dict` writes.
fn as_price(value: &Value) -> Option<f64> {
    value.as_f64().or_else(|| {
        value
            .as_str()
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|price| !price.is_finite())
    })
}

fn as_date(value: &Value) -> Option<NaiveDate> {
    value
        .as_str()
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;

    fn widget() -> Product {
        Product {
            description: Some("A small widget".to_string()),
            date_purchase: NaiveDate::from_ymd_opt(2021, 3, 14),
            ..Product::new("Widget", Some(9.99), 5)
        }
    }

    fn record(value: serde_json::Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("expected a JSON object, got {other}"),
        }
    }

    /// Store double that records which port methods were called.
    #[derive(Default)]
    struct RecordingStore {
        calls: Mutex<Vec<&'static str>>,
        rows: Mutex<BTreeMap<ProductId, Product>>,
    }

    impl RecordingStore {
        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProductStore for RecordingStore {
        async fn insert(&self, product: &Product) -> Result<Product, StoreError> {
            self.calls.lock().unwrap().push("insert");
            let mut rows = self.rows.lock().unwrap();
            let id = ProductId::new(rows.len() as i64 + 1);
            let stored = product.clone().with_id(id);
            rows.insert(id, stored.clone());
            Ok(stored)
        }

        async fn update(&self, product: &Product) -> Result<(), StoreError> {
            self.calls.lock().unwrap().push("update");
            let id = product.id().ok_or(StoreError::NotPersisted)?;
            self.rows.lock().unwrap().insert(id, product.clone());
            Ok(())
        }

        async fn delete(&self, id: ProductId) -> Result<(), StoreError> {
            self.calls.lock().unwrap().push("delete");
            self.rows.lock().unwrap().remove(&id);
            Ok(())
        }

        async fn list(&self) -> Result<Vec<Product>, StoreError> {
            self.calls.lock().unwrap().push("list");
            Ok(self.rows.lock().unwrap().values().cloned().collect())
        }

        async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
            self.calls.lock().unwrap().push("get");
            Ok(self.rows.lock().unwrap().get(&id).cloned())
        }
    }

    #[test]
    fn display_matches_repr() {
        let mut product = Product::default();
        product.name = Some("Foo".to_string());
        assert_eq!(product.to_string(), "<Product 'Foo'>");
        assert_eq!(Product::default().to_string(), "<Product None>");
    }

    #[test]
    fn new_product_has_defaults() {
        let product = Product::default();
        assert_eq!(product.id(), None);
        assert!(!product.is_persisted());
        assert!(!product.disabled);
        assert_eq!(product.date_purchase, None);
    }

    #[test]
    fn to_dict_has_exactly_the_seven_attributes() {
        let dict = widget().to_dict();
        assert_eq!(dict.len(), 7);
        for key in fields::ALL {
            assert!(dict.contains_key(key), "missing {key}");
        }
        assert_eq!(dict["id"], Value::Null);
        assert_eq!(dict["name"], json!("Widget"));
        assert_eq!(dict["description"], json!("A small widget"));
        assert_eq!(dict["price"], json!(9.99));
        assert_eq!(dict["disabled"], json!(false));
        assert_eq!(dict["date_purchase"], json!("2021-03-14"));
        assert_eq!(dict["stock_quantity"], json!(5));
    }

    #[test]
    fn from_dict_assigns_fixture_fields() {
        let data = record(json!({
            "name": "Gadget",
            "description": "Shiny",
            "price": 12.5,
            "disabled": true,
            "date_purchase": "2020-06-01",
            "stock_quantity": 42
        }));

        let product = Product::from_dict(&data).unwrap();
        assert_eq!(product.id(), None);
        assert_eq!(product.name.as_deref(), Some("Gadget"));
        assert_eq!(product.description.as_deref(), Some("Shiny"));
        assert_eq!(product.price, Some(12.5));
        assert!(product.disabled);
        assert_eq!(product.date_purchase, NaiveDate::from_ymd_opt(2020, 6, 1));
        assert_eq!(product.stock_quantity, 42);
    }

    #[test]
    fn apply_dict_ignores_unknown_keys_and_keeps_missing_ones() {
        let mut product = widget();
        let data = record(json!({ "name": "Renamed", "colour": "blue" }));

        product.apply_dict(&data).unwrap();

        assert_eq!(product.name.as_deref(), Some("Renamed"));
        assert_eq!(product.price, Some(9.99));
        assert_eq!(product.stock_quantity, 5);
    }

    #[test]
    fn apply_dict_accepts_null_for_optional_fields() {
        let mut product = widget();
        let data = record(json!({ "price": null, "description": null }));

        product.apply_dict(&data).unwrap();

        assert_eq!(product.price, None);
        assert_eq!(product.description, None);
    }

    #[test]
    fn apply_dict_does_not_check_lengths() {
        let long = "x".repeat(200);
        let product = Product::from_dict(&record(json!({ "name": long.clone() }))).unwrap();
        assert_eq!(product.name, Some(long));
    }

    #[test]
    fn apply_dict_rejects_unrepresentable_values_atomically() {
        let mut product = widget();
        let data = record(json!({ "name": "Changed", "stock_quantity": "ten" }));

        let err = product.apply_dict(&data).unwrap_err();

        assert!(err.message().contains("stock_quantity"));
        assert_eq!(product, widget());
    }

    #[test]
    fn apply_dict_rejects_null_for_required_fields() {
        let err = Product::from_dict(&record(json!({ "disabled": null }))).unwrap_err();
        assert!(err.message().contains("disabled"));
    }

    #[test]
    fn apply_dict_rejects_malformed_dates() {
        let err = Product::from_dict(&record(json!({ "date_purchase": "14/03/2021" }))).unwrap_err();
        assert!(err.message().contains("date_purchase"));
    }

    #[test]
    fn non_finite_prices_survive_the_dict_form() {
        for price in [f64::INFINITY, f64::NEG_INFINITY] {
            let product = Product {
                price: Some(price),
                ..widget()
            };
            let dict = product.to_dict();
            assert!(dict["price"].is_string(), "{}", dict["price"]);
            assert_eq!(Product::from_dict(&dict).unwrap(), product);
        }

        let nan = Product {
            price: Some(f64::NAN),
            ..widget()
        };
        let restored = Product::from_dict(&nan.to_dict()).unwrap();
        assert!(restored.price.is_some_and(f64::is_nan));
    }

    #[test]
    fn numeric_strings_are_not_prices() {
        let err = Product::from_dict(&record(json!({ "price": "12.5" }))).unwrap_err();
        assert!(err.message().contains("price"));
    }

    #[test]
    fn apply_dict_assigns_id() {
        let product = Product::from_dict(&record(json!({ "id": 7 }))).unwrap();
        assert_eq!(product.id(), Some(ProductId::new(7)));
    }

    #[tokio::test]
    async fn create_takes_on_stored_id() {
        let store = RecordingStore::default();
        let mut product = widget();

        product.create(&store).await.unwrap();

        assert_eq!(product.id(), Some(ProductId::new(1)));
        assert_eq!(store.calls(), vec!["insert"]);
    }

    #[tokio::test]
    async fn update_without_id_fails_and_does_not_touch_store() {
        let store = RecordingStore::default();
        let product = widget();

        let err = product.update(&store).await.unwrap_err();

        assert!(err.is_data_validation());
        assert_eq!(err.to_string(), "Update called with empty ID field");
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn update_writes_current_fields() {
        let store = RecordingStore::default();
        let mut product = widget();
        product.create(&store).await.unwrap();

        product.name = Some("Widget2".to_string());
        product.update(&store).await.unwrap();

        let id = product.id().unwrap();
        let found = Product::find(&store, id).await.unwrap().unwrap();
        assert_eq!(found.name.as_deref(), Some("Widget2"));
    }

    #[tokio::test]
    async fn delete_without_id_is_a_store_error() {
        let store = RecordingStore::default();

        let err = widget().delete(&store).await.unwrap_err();

        assert!(matches!(err.as_store(), Some(StoreError::NotPersisted)));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let store = RecordingStore::default();
        let mut product = widget();
        product.create(&store).await.unwrap();
        let id = product.id().unwrap();

        product.delete(&store).await.unwrap();

        assert!(Product::find(&store, id).await.unwrap().is_none());
        assert!(Product::all(&store).await.unwrap().is_empty());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn any_product() -> impl Strategy<Value = Product> {
            (
                proptest::option::of(1i64..i64::MAX),
                proptest::option::of("[A-Za-z0-9 ]{0,64}"),
                proptest::option::of("[A-Za-z0-9 .,]{0,64}"),
                proptest::option::of(
                    any::<f64>().prop_filter("NaN never equals itself", |p| !p.is_nan()),
                ),
                any::<bool>(),
                proptest::option::of(0i64..50_000),
                any::<i32>(),
            )
                .prop_map(|(id, name, description, price, disabled, days, stock_quantity)| {
                    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
                    Product {
                        id: id.map(ProductId::new),
                        name,
                        description,
                        price,
                        disabled,
                        date_purchase: days.map(|d| epoch + chrono::Days::new(d as u64)),
                        stock_quantity,
                    }
                })
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 500,
                ..ProptestConfig::default()
            })]

            /// Property: the dictionary form round-trips every attribute.
            #[test]
            fn dict_round_trip(product in any_product()) {
                let restored = Product::from_dict(&product.to_dict()).unwrap();
                prop_assert_eq!(restored, product);
            }
        }
    }
}
