#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Dimension resolver for the AirPure warehouse.
//!
//! Each dimension keeps an in-memory map from natural key to surrogate key,
//! seeded once per run from the warehouse. Keys the warehouse has not seen
//! are assigned `max + 1, max + 2, ...` in first-encounter order and held
//! as pending rows until the dimension is flushed with one bulk load.
//!
//! Resolution never fails: a blank or otherwise unusable natural key
//! resolves to `None`, which the fact mapper treats as a missing foreign
//! key.

pub mod city;
pub mod date;
pub mod state;

use std::collections::BTreeMap;

pub use city::{CityClassifier, CityDimension};
pub use date::DateDimension;
pub use state::{RegionLookup, StateDimension};

/// Natural key to surrogate key map with pending-assignment tracking.
#[derive(Debug, Clone)]
pub struct SurrogateKeys<K: Ord + Clone> {
    keys: BTreeMap<K, i64>,
    max_key: i64,
    pending: Vec<(K, i64)>,
}

impl<K: Ord + Clone> Default for SurrogateKeys<K> {
    fn default() -> Self {
        Self {
            keys: BTreeMap::new(),
            max_key: 0,
            pending: Vec::new(),
        }
    }
}

impl<K: Ord + Clone> SurrogateKeys<K> {
    /// Creates an empty key map. The first assigned key is 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the map with keys already stored in the warehouse. None of
    /// them become pending.
    pub fn from_existing(existing: impl IntoIterator<Item = (K, i64)>) -> Self {
        let mut this = Self::new();
        for (key, id) in existing {
            this.max_key = this.max_key.max(id);
            this.keys.insert(key, id);
        }
        this
    }

    /// Returns the surrogate key for `key` without assigning one.
    #[must_use]
    pub fn lookup(&self, key: &K) -> Option<i64> {
        self.keys.get(key).copied()
    }

    /// Returns the surrogate key for `key`, assigning the next free key on
    /// first encounter. The flag is `true` when the key is new.
    pub fn resolve_or_assign(&mut self, key: K) -> (i64, bool) {
        if let Some(id) = self.keys.get(&key) {
            return (*id, false);
        }
        self.max_key += 1;
        let id = self.max_key;
        self.keys.insert(key.clone(), id);
        self.pending.push((key, id));
        (id, true)
    }

    /// Drains the keys assigned since the last call, in assignment order.
    pub fn take_pending(&mut self) -> Vec<(K, i64)> {
        std::mem::take(&mut self.pending)
    }

    /// Number of known natural keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if no keys are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
