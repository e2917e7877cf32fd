#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Fact mapper for the AirPure warehouse.
//!
//! Turns [`RawTable`](airpure_source::RawTable) rows into warehouse rows:
//! renames source columns, coerces measures, joins natural keys against
//! the resolved dimensions, and drops rows missing a required key. Each
//! source row yields at most one output row. There is no deduplication.

pub mod coerce;
pub mod columns;
pub mod keys;
pub mod raw;
pub mod star;

use airpure_dimension::{CityDimension, DateDimension, StateDimension};

pub use columns::FieldMap;
pub use keys::{observe_cities, observe_states};
pub use raw::{RawRows, map_raw};
pub use star::{map_aqi, map_disease, map_population, map_vehicle};

/// Rows produced by a mapper, plus how many source rows were dropped for
/// missing a required key.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedFacts<T> {
    /// Rows that passed the required-key policy, in source order.
    pub rows: Vec<T>,
    /// Source rows dropped.
    pub dropped: usize,
}

impl<T> Default for MappedFacts<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            dropped: 0,
        }
    }
}

impl<T> MappedFacts<T> {
    /// Number of rows kept.
    #[must_use]
    pub fn kept(&self) -> usize {
        self.rows.len()
    }
}

/// Read-only view of the resolved dimensions that mappers join against.
#[derive(Debug, Clone, Copy)]
pub struct Dimensions<'a> {
    /// State keys.
    pub states: &'a StateDimension,
    /// City keys.
    pub cities: &'a CityDimension,
    /// Date keys.
    pub dates: &'a DateDimension,
}
