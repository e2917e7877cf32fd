//! City dimension.
//!
//! A city's natural key is its trimmed name together with the surrogate
//! key of its state, so two cities with the same name in different states
//! are separate rows.

use std::collections::BTreeSet;

use airpure_config::LookupTables;
use airpure_warehouse::Connection;
use airpure_warehouse::WarehouseError;
use airpure_warehouse::loader::{LoadOptions, load_rows};
use airpure_warehouse::progress::ProgressCallback;
use airpure_warehouse::queries;
use airpure_warehouse_models::{CityRow, CityTier};

use crate::SurrogateKeys;

/// Tier and metro classification from the configured city lists. Matching
/// is exact and case-sensitive.
#[derive(Debug, Clone, Default)]
pub struct CityClassifier {
    tier1: BTreeSet<String>,
    tier2: BTreeSet<String>,
    metro: BTreeSet<String>,
}

impl CityClassifier {
    /// Builds the classifier from the configured tables.
    #[must_use]
    pub fn new(lookups: &LookupTables) -> Self {
        Self {
            tier1: lookups.tier1_cities.iter().cloned().collect(),
            tier2: lookups.tier2_cities.iter().cloned().collect(),
            metro: lookups.metro_cities.iter().cloned().collect(),
        }
    }

    /// Tier 1 if listed there, else Tier 2 if listed there, else Tier 3.
    #[must_use]
    pub fn tier(&self, city_name: &str) -> CityTier {
        if self.tier1.contains(city_name) {
            CityTier::Tier1
        } else if self.tier2.contains(city_name) {
            CityTier::Tier2
        } else {
            CityTier::Tier3
        }
    }

    /// Whether the city is in the metro list.
    #[must_use]
    pub fn is_metro(&self, city_name: &str) -> bool {
        self.metro.contains(city_name)
    }
}

/// The city dimension's key cache.
#[derive(Debug, Clone)]
pub struct CityDimension {
    keys: SurrogateKeys<(String, i64)>,
    classifier: CityClassifier,
}

impl CityDimension {
    /// Creates an empty dimension.
    #[must_use]
    pub fn new(lookups: &LookupTables) -> Self {
        Self {
            keys: SurrogateKeys::new(),
            classifier: CityClassifier::new(lookups),
        }
    }

    /// Seeds the dimension from `dim_city`.
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError`] if the keys cannot be read.
    pub fn load(conn: &Connection, lookups: &LookupTables) -> Result<Self, WarehouseError> {
        let existing = queries::city_keys(conn)?;
        log::debug!("Loaded {} existing cities", existing.len());
        Ok(Self {
            keys: SurrogateKeys::from_existing(
                existing
                    .into_iter()
                    .map(|(id, name, state_id)| ((name, state_id), id)),
            ),
            classifier: CityClassifier::new(lookups),
        })
    }

    /// Resolves a city within a state, assigning a new key on first
    /// encounter. A blank name or missing state key resolves to `None`.
    pub fn resolve(&mut self, city_name: &str, state_id: Option<i64>) -> Option<i64> {
        let name = city_name.trim();
        let state_id = state_id?;
        if name.is_empty() {
            return None;
        }
        Some(self.keys.resolve_or_assign((name.to_string(), state_id)).0)
    }

    /// Looks up a city without assigning a key.
    #[must_use]
    pub fn lookup(&self, city_name: &str, state_id: i64) -> Option<i64> {
        self.keys.lookup(&(city_name.trim().to_string(), state_id))
    }

    /// Number of known cities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if no cities are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Drains the cities assigned since the last flush as rows.
    pub fn take_new_rows(&mut self) -> Vec<CityRow> {
        self.keys
            .take_pending()
            .into_iter()
            .map(|((city_name, state_id), city_id)| CityRow {
                city_id,
                state_id,
                city_tier: self.classifier.tier(&city_name),
                is_metro: self.classifier.is_metro(&city_name),
                city_name,
            })
            .collect()
    }

    /// Appends the new cities to `dim_city` in one bulk load. Their states
    /// must already be flushed.
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError`] if the load fails.
    pub fn flush(
        &mut self,
        conn: &Connection,
        options: &LoadOptions,
        progress: &dyn ProgressCallback,
    ) -> Result<u64, WarehouseError> {
        let rows = self.take_new_rows();
        if rows.is_empty() {
            return Ok(0);
        }
        let inserted = load_rows(conn, &rows, &options.appending(), progress)?;
        log::info!("Cities populated: {inserted} new records");
        Ok(inserted)
    }
}
