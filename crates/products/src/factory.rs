//! Fake product data for tests and local seeding.

use chrono::{Days, NaiveDate, Utc};
use fake::Fake;
use fake::faker::lorem::en::Sentence;
use fake::faker::name::en::Name;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::product::{Product, ProductId, TEXT_MAX_LEN};

/// Builds unsaved products with plausible random field values.
///
/// Each built product carries the next id of a sequence starting at 1, so a
/// batch can be inserted as-is.
pub struct ProductFactory {
    rng: StdRng,
    next_id: i64,
}

impl ProductFactory {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic factory, for reproducible failures.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self { rng, next_id: 1 }
    }

    pub fn build(&mut self) -> Product {
        let id = ProductId::new(self.next_id);
        self.next_id += 1;

        let name: String = Name().fake_with_rng(&mut self.rng);
        let description: String = Sentence(2..6).fake_with_rng(&mut self.rng);

        Product {
            name: Some(clip(name)),
            description: Some(clip(description)),
            price: Some(self.rng.gen_range(1.0..100.0)),
            disabled: self.rng.gen_bool(0.5),
            date_purchase: Some(self.purchase_date()),
            stock_quantity: self.rng.gen_range(0..=1500),
            ..Product::default()
        }
        .with_id(id)
    }

    pub fn build_batch(&mut self, count: usize) -> Vec<Product> {
        (0..count).map(|_| self.build()).collect()
    }

    /// A date between 2020-01-01 and today.
    fn purchase_date(&mut self) -> NaiveDate {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default();
        let today = Utc::now().date_naive();
        let span = (today - start).num_days().max(0) as u64;
        start + Days::new(self.rng.gen_range(0..=span))
    }
}

impl Default for ProductFactory {
    fn default() -> Self {
        Self::new()
    }
}

fn clip(mut text: String) -> String {
    if let Some((idx, _)) = text.char_indices().nth(TEXT_MAX_LEN) {
        text.truncate(idx);
    }
    text
}
