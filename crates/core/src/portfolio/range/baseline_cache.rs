use rust_decimal::Decimal;
use std::collections::HashMap;

use super::range_model::PnlRange;

/// Baseline prices keyed by (symbol, window). An entry, once stored, is
/// never replaced.
#[derive(Debug, Clone, Default)]
pub struct BaselineCache {
    entries: HashMap<(String, PnlRange), Decimal>,
}

impl BaselineCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str, window: PnlRange) -> Option<Decimal> {
        self.entries.get(&(key.to_string(), window)).copied()
    }

    pub fn contains(&self, key: &str, window: PnlRange) -> bool {
        self.entries.contains_key(&(key.to_string(), window))
    }

    /// Stores a baseline unless one is already cached. Returns whether the
    /// value was stored.
    pub fn insert_if_absent(&mut self, key: &str, window: PnlRange, price: Decimal) -> bool {
        if price <= Decimal::ZERO {
            return false;
        }
        let slot = (key.to_string(), window);
        if self.entries.contains_key(&slot) {
            return false;
        }
        self.entries.insert(slot, price);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
