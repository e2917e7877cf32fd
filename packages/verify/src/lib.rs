#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Row count verification.
//!
//! For every configured dataset, counts the data rows in the source file
//! and the rows in its raw table, and reports whether they agree. The
//! report is diagnostic only: a failed count is recorded as
//! [`VerifyStatus::Error`], never raised.

use std::path::PathBuf;

use airpure_config::{PipelineConfig, SourceFormat};
use airpure_source::count::count_data_rows;
use airpure_warehouse::Connection;
use airpure_warehouse::queries::table_count;
use strum_macros::{AsRefStr, Display, EnumString};

/// Outcome of one source/table comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum VerifyStatus {
    /// Both counts were obtained and are equal.
    Match,
    /// Both counts were obtained and differ.
    Mismatch,
    /// At least one count could not be obtained.
    Error,
}

/// A source file paired with the table it was loaded into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyTarget {
    /// Dataset identifier.
    pub dataset_id: String,
    /// Source file.
    pub path: PathBuf,
    /// Source file format.
    pub format: SourceFormat,
    /// Warehouse table.
    pub table: String,
}

/// Result of verifying one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyResult {
    /// Dataset identifier.
    pub dataset_id: String,
    /// Warehouse table.
    pub table: String,
    /// Data rows in the source, if they could be counted.
    pub source_count: Option<u64>,
    /// Rows in the table, if they could be counted.
    pub db_count: Option<u64>,
    /// Comparison outcome.
    pub status: VerifyStatus,
    /// Why a count failed, for [`VerifyStatus::Error`].
    pub error: Option<String>,
}

/// Aggregate verification report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    /// Per-target results, in configuration order.
    pub results: Vec<VerifyResult>,
}

impl VerifyReport {
    /// Returns `true` if every target matched.
    #[must_use]
    pub fn all_match(&self) -> bool {
        self.results
            .iter()
            .all(|r| r.status == VerifyStatus::Match)
    }

    /// Number of targets that matched.
    #[must_use]
    pub fn matched(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == VerifyStatus::Match)
            .count()
    }
}

/// Pairs every configured dataset with its raw table.
#[must_use]
pub fn raw_targets(config: &PipelineConfig) -> Vec<VerifyTarget> {
    config
        .datasets
        .iter()
        .map(|d| VerifyTarget {
            dataset_id: d.id.clone(),
            path: d.path(&config.sources),
            format: d.format,
            table: d.raw_table.clone(),
        })
        .collect()
}

/// Classifies a pair of count attempts.
#[must_use]
pub fn compare(
    source: &Result<u64, String>,
    db: &Result<u64, String>,
) -> (VerifyStatus, Option<String>) {
    match (source, db) {
        (Ok(s), Ok(d)) if s == d => (VerifyStatus::Match, None),
        (Ok(_), Ok(_)) => (VerifyStatus::Mismatch, None),
        (Err(e), Ok(_)) => (VerifyStatus::Error, Some(format!("source: {e}"))),
        (Ok(_), Err(e)) => (VerifyStatus::Error, Some(format!("table: {e}"))),
        (Err(s), Err(d)) => (
            VerifyStatus::Error,
            Some(format!("source: {s}; table: {d}")),
        ),
    }
}

/// Verifies each target against the warehouse.
#[must_use]
pub fn verify(conn: &Connection, targets: &[VerifyTarget]) -> VerifyReport {
    let results = targets
        .iter()
        .map(|target| {
            let source = count_data_rows(&target.path, target.format).map_err(|e| e.to_string());
            let db = table_count(conn, &target.table).map_err(|e| e.to_string());
            let (status, error) = compare(&source, &db);

            match status {
                VerifyStatus::Match => log::info!("{}: {status}", target.table),
                _ => log::warn!(
                    "{}: {status} (source {:?}, table {:?})",
                    target.table,
                    source,
                    db
                ),
            }

            VerifyResult {
                dataset_id: target.dataset_id.clone(),
                table: target.table.clone(),
                source_count: source.ok(),
                db_count: db.ok(),
                status,
                error,
            }
        })
        .collect();

    VerifyReport { results }
}
