#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Load results and run summary types.

use std::path::PathBuf;
use std::time::Duration;

use airpure_warehouse_models::FactKind;
use serde::{Deserialize, Serialize};

/// Result of loading one dataset into its star-schema table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarLoadResult {
    /// Dataset identifier from the configuration.
    pub dataset_id: String,
    /// Kind of facts the dataset holds.
    pub kind: FactKind,
    /// Target table.
    pub table: String,
    /// Data rows read from the source file.
    pub rows_read: u64,
    /// Rows written to the table.
    pub rows_loaded: u64,
    /// Rows dropped for a missing required key.
    pub rows_dropped: u64,
}

/// Summary of a complete star load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarLoadSummary {
    /// Days added to `dim_date`.
    pub dates_added: u64,
    /// States added to `dim_state`.
    pub states_added: u64,
    /// Cities added to `dim_city`.
    pub cities_added: u64,
    /// Per-dataset results, in configuration order.
    pub datasets: Vec<StarLoadResult>,
    /// Wall-clock duration of the run.
    pub duration: Duration,
}

impl StarLoadSummary {
    /// Total fact rows written across datasets.
    #[must_use]
    pub fn rows_loaded(&self) -> u64 {
        self.datasets.iter().map(|d| d.rows_loaded).sum()
    }

    /// Total rows dropped across datasets.
    #[must_use]
    pub fn rows_dropped(&self) -> u64 {
        self.datasets.iter().map(|d| d.rows_dropped).sum()
    }
}

/// Outcome of loading one dataset into its raw table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RawLoadOutcome {
    /// The dataset loaded; carries the number of rows written.
    Loaded {
        /// Rows written.
        rows: u64,
    },
    /// The dataset failed and was skipped.
    Failed {
        /// Why the dataset failed.
        error: String,
    },
}

/// Result of loading one dataset into its raw table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLoadResult {
    /// Dataset identifier from the configuration.
    pub dataset_id: String,
    /// Target raw table.
    pub table: String,
    /// What happened.
    pub outcome: RawLoadOutcome,
}

impl RawLoadResult {
    /// Returns `true` if the dataset loaded.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        matches!(self.outcome, RawLoadOutcome::Loaded { .. })
    }
}

/// Summary of a raw load run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLoadSummary {
    /// Per-dataset results, in configuration order.
    pub datasets: Vec<RawLoadResult>,
    /// Wall-clock duration of the run.
    pub duration: Duration,
}

impl RawLoadSummary {
    /// Number of datasets that failed.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.datasets.iter().filter(|d| !d.succeeded()).count()
    }
}

/// Row count of one warehouse table. `rows` is `None` when the count
/// failed, typically because the table does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCount {
    /// Table name.
    pub table: String,
    /// Number of rows, if it could be counted.
    pub rows: Option<u64>,
}

/// A table written to CSV by the export step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedTable {
    /// Source table.
    pub table: String,
    /// File that was written.
    pub path: PathBuf,
    /// Rows written, excluding the header.
    pub rows: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn star(kind: FactKind, loaded: u64, dropped: u64) -> StarLoadResult {
        StarLoadResult {
            dataset_id: kind.to_string(),
            kind,
            table: format!("fact_{kind}"),
            rows_read: loaded + dropped,
            rows_loaded: loaded,
            rows_dropped: dropped,
        }
    }

    #[test]
    fn star_summary_totals() {
        let summary = StarLoadSummary {
            datasets: vec![star(FactKind::Aqi, 10, 2), star(FactKind::Disease, 5, 0)],
            ..StarLoadSummary::default()
        };
        assert_eq!(summary.rows_loaded(), 15);
        assert_eq!(summary.rows_dropped(), 2);
    }

    #[test]
    fn raw_summary_counts_failures() {
        let summary = RawLoadSummary {
            datasets: vec![
                RawLoadResult {
                    dataset_id: "aqi".into(),
                    table: "aqi_daily".into(),
                    outcome: RawLoadOutcome::Loaded { rows: 3 },
                },
                RawLoadResult {
                    dataset_id: "population".into(),
                    table: "population".into(),
                    outcome: RawLoadOutcome::Failed {
                        error: "missing file".into(),
                    },
                },
            ],
            duration: Duration::ZERO,
        };
        assert_eq!(summary.failures(), 1);
        assert!(summary.datasets[0].succeeded());
    }
}
