//! Natural key discovery.
//!
//! Walks a source table and resolves every state (and city) it mentions
//! so that new keys are assigned before facts are mapped. The dimensions
//! are flushed by the caller.

use airpure_dimension::{CityDimension, StateDimension};
use airpure_source::RawTable;

/// Resolves every state under `state_column`. Returns the number of
/// states newly assigned.
pub fn observe_states(table: &RawTable, state_column: &str, states: &mut StateDimension) -> usize {
    let before = states.len();
    for row in table.iter() {
        if let Some(name) = row.non_blank(state_column) {
            states.resolve(name);
        }
    }
    states.len() - before
}

/// Resolves every `(city, state)` pair. States must already be observed;
/// rows whose state did not resolve are skipped. Returns the number of
/// cities newly assigned.
pub fn observe_cities(
    table: &RawTable,
    city_column: &str,
    state_column: &str,
    states: &StateDimension,
    cities: &mut CityDimension,
) -> usize {
    let before = cities.len();
    for row in table.iter() {
        let Some(city) = row.non_blank(city_column) else {
            continue;
        };
        let state_id = row.non_blank(state_column).and_then(|s| states.lookup(s));
        cities.resolve(city, state_id);
    }
    cities.len() - before
}
