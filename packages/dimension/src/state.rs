//! State dimension.

use std::collections::BTreeMap;

use airpure_config::LookupTables;
use airpure_warehouse::Connection;
use airpure_warehouse::WarehouseError;
use airpure_warehouse::loader::{LoadOptions, load_rows};
use airpure_warehouse::progress::ProgressCallback;
use airpure_warehouse::queries;
use airpure_warehouse_models::{Region, StateRow};

use crate::SurrogateKeys;

/// State name to region lookup.
///
/// Built from the configured region lists in lookup order; when a state
/// appears in more than one list the first one wins.
#[derive(Debug, Clone, Default)]
pub struct RegionLookup {
    regions: BTreeMap<String, Region>,
}

impl RegionLookup {
    /// Builds the lookup from the configured tables.
    #[must_use]
    pub fn new(lookups: &LookupTables) -> Self {
        let mut regions = BTreeMap::new();
        for (region, states) in lookups.ordered_regions() {
            for state in states {
                regions.entry(state.clone()).or_insert(region);
            }
        }
        Self { regions }
    }

    /// Region of a state. Matching is exact; unknown states are
    /// [`Region::Other`].
    #[must_use]
    pub fn region_for(&self, state_name: &str) -> Region {
        self.regions
            .get(state_name)
            .copied()
            .unwrap_or(Region::Other)
    }
}

/// The state dimension's key cache.
#[derive(Debug, Clone)]
pub struct StateDimension {
    keys: SurrogateKeys<String>,
    regions: RegionLookup,
}

impl StateDimension {
    /// Creates an empty dimension.
    #[must_use]
    pub fn new(lookups: &LookupTables) -> Self {
        Self {
            keys: SurrogateKeys::new(),
            regions: RegionLookup::new(lookups),
        }
    }

    /// Seeds the dimension from `dim_state`.
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError`] if the keys cannot be read.
    pub fn load(conn: &Connection, lookups: &LookupTables) -> Result<Self, WarehouseError> {
        let existing = queries::state_keys(conn)?;
        log::debug!("Loaded {} existing states", existing.len());
        Ok(Self {
            keys: SurrogateKeys::from_existing(existing.into_iter().map(|(id, name)| (name, id))),
            regions: RegionLookup::new(lookups),
        })
    }

    /// Resolves a state name to its surrogate key, assigning a new key on
    /// first encounter. Blank names resolve to `None`.
    pub fn resolve(&mut self, state_name: &str) -> Option<i64> {
        let name = state_name.trim();
        if name.is_empty() {
            return None;
        }
        Some(self.keys.resolve_or_assign(name.to_string()).0)
    }

    /// Looks up a state without assigning a key.
    #[must_use]
    pub fn lookup(&self, state_name: &str) -> Option<i64> {
        self.keys.lookup(&state_name.trim().to_string())
    }

    /// Region of a state.
    #[must_use]
    pub fn region_for(&self, state_name: &str) -> Region {
        self.regions.region_for(state_name.trim())
    }

    /// Number of known states.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if no states are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Drains the states assigned since the last flush as rows.
    pub fn take_new_rows(&mut self) -> Vec<StateRow> {
        self.keys
            .take_pending()
            .into_iter()
            .map(|(state_name, state_id)| StateRow {
                state_id,
                region: self.regions.region_for(&state_name),
                state_name,
            })
            .collect()
    }

    /// Appends the new states to `dim_state` in one bulk load.
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
        log::info!("States populated: {inserted} new records");
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use airpure_config::PipelineConfig;
    use airpure_warehouse::progress::NullProgress;
    use airpure_warehouse::schema;

    use super::*;

    fn lookups() -> LookupTables {
        PipelineConfig::embedded().unwrap().lookups
    }

    #[test]
    fn regions_from_lookup_and_other_fallback() {
        let dim = StateDimension::new(&lookups());
        assert_eq!(dim.region_for("Delhi"), Region::North);
        assert_eq!(dim.region_for(" Kerala "), Region::South);
        assert_eq!(dim.region_for("Goa"), Region::West);
        assert_eq!(dim.region_for("Sikkim"), Region::Northeast);
        assert_eq!(dim.region_for("Atlantis"), Region::Other);
        assert_eq!(dim.region_for("delhi"), Region::Other);
    }

    #[test]
    fn first_listed_region_wins() {
        let mut tables = LookupTables::default();
        tables
            .regions
            .insert("South".to_string(), vec!["Twice".to_string()]);
        tables
            .regions
            .insert("North".to_string(), vec!["Twice".to_string()]);
        assert_eq!(RegionLookup::new(&tables).region_for("Twice"), Region::North);
    }

    #[test]
    fn resolve_trims_and_reuses_keys() {
        let mut dim = StateDimension::new(&lookups());
        let a = dim.resolve("  Delhi ").unwrap();
        let b = dim.resolve("Delhi").unwrap();
        assert_eq!(a, b);
        assert_eq!(dim.lookup("Delhi"), Some(a));
        assert_eq!(dim.len(), 1);
    }

    #[test]
    fn blank_names_do_not_resolve() {
        let mut dim = StateDimension::new(&lookups());
        assert_eq!(dim.resolve(""), None);
        assert_eq!(dim.resolve("   "), None);
        assert!(dim.is_empty());
    }

    #[test]
    fn new_rows_carry_regions() {
        let mut dim = StateDimension::new(&lookups());
        dim.resolve("Kerala");
        dim.resolve("Atlantis");
        let rows = dim.take_new_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].state_id, 1);
        assert_eq!(rows[0].region, Region::South);
        assert_eq!(rows[1].state_id, 2);
        assert_eq!(rows[1].region, Region::Other);
        assert!(dim.take_new_rows().is_empty());
    }

    #[test]
    fn flush_then_reload_reuses_keys() {
        let conn = Connection::open_in_memory().unwrap();
        schema::apply(&conn, None).unwrap();

        let mut dim = StateDimension::load(&conn, &lookups()).unwrap();
        let delhi = dim.resolve("Delhi").unwrap();
        dim.resolve("Goa");
        assert_eq!(
            dim.flush(&conn, &LoadOptions::default(), &NullProgress).unwrap(),
            2
        );

        let mut reloaded = StateDimension::load(&conn, &lookups()).unwrap();
        assert_eq!(reloaded.resolve("Delhi"), Some(delhi));
        assert_eq!(reloaded.resolve("Punjab"), Some(3));
        assert_eq!(
            reloaded
                .flush(&conn, &LoadOptions::default(), &NullProgress)
                .unwrap(),
            1
        );
        assert_eq!(queries::table_count(&conn, "dim_state").unwrap(), 3);
    }
}
