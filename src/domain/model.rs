use serde::{Deserialize, Serialize};
use std::collections::btree_map::{self, BTreeMap};

/// Quantity per commodity held on the carrier.
///
/// Keys are trimmed and lower-cased on every insertion path. Blank names and
/// zero quantities are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CargoTally(BTreeMap<String, u64>);

impl CargoTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, commodity: &str) -> u64 {
        self.0
            .get(&key(commodity))
            .copied()
            .unwrap_or(0)
    }

    /// Sets the quantity of a commodity, removing it when `qty` is zero.
    /// A blank commodity name is ignored.
    pub fn set(&mut self, commodity: &str, qty: u64) {
        let key = key(commodity);
        if key.is_empty() {
            return;
        }
        if qty == 0 {
            self.0.remove(&key);
        } else {
            self.0.insert(key, qty);
        }
    }

    /// Adds `qty` to whatever is already held.
    pub fn add(&mut self, commodity: &str, qty: u64) {
        let current = self.get(commodity);
        self.set(commodity, current.saturating_add(qty));
    }

    /// Applies a signed delta. A result at or below zero drops the entry.
    pub fn adjust(&mut self, commodity: &str, delta: i64) {
        let current = self.get(commodity) as i128;
        let next = current + delta as i128;
        if next <= 0 {
            self.set(commodity, 0);
        } else {
            self.set(commodity, u64::try_from(next).unwrap_or(u64::MAX));
        }
    }

    pub fn remove(&mut self, commodity: &str) -> Option<u64> {
        self.0.remove(&key(commodity))
    }

    pub fn contains(&self, commodity: &str) -> bool {
        self.0.contains_key(&key(commodity))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.0.values().fold(0u64, |acc, qty| acc.saturating_add(*qty))
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, u64> {
        self.0.iter()
    }

    /// Restores the tally invariants after deserializing untrusted data:
    /// keys are re-cased and merged, blank names and zero entries dropped.
    pub fn normalized(self) -> Self {
        self.0.into_iter().collect()
    }
}

fn key(commodity: &str) -> String {
    commodity.trim().to_lowercase()
}

impl FromIterator<(String, u64)> for CargoTally {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        let mut tally = CargoTally::new();
        for (commodity, qty) in iter {
            tally.add(&commodity, qty);
        }
        tally
    }
}

impl<'a> IntoIterator for &'a CargoTally {
    type Item = (&'a String, &'a u64);
    type IntoIter = btree_map::Iter<'a, String, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Immutable point-in-time view of the carrier: its call sign, if known,
/// and the cargo it holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    call_sign: Option<String>,
    tally: CargoTally,
}

impl InventorySnapshot {
    pub fn new(call_sign: Option<String>, tally: CargoTally) -> Self {
        Self { call_sign, tally }
    }

    pub fn call_sign(&self) -> Option<&str> {
        self.call_sign.as_deref()
    }

    pub fn tally(&self) -> &CargoTally {
        &self.tally
    }

    pub fn with_tally(&self, tally: CargoTally) -> Self {
        Self {
            call_sign: self.call_sign.clone(),
            tally,
        }
    }
}

/// What a read-modify-write visitor asks the arbiter to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Leave the inventory untouched.
    Keep,
    /// Replace the tally, keeping the current call sign.
    Replace(CargoTally),
    /// Replace the call sign and the tally together.
    Resync(InventorySnapshot),
}
