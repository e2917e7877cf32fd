//! Bulk loader.
//!
//! Appends rows to a warehouse table with one multi-row `INSERT` per batch.
//! Row order is preserved within and across batches. Batches are not
//! wrapped in a shared transaction: if batch `k` fails, batches before it
//! stay committed.

use std::collections::BTreeSet;

use airpure_config::{DEFAULT_BATCH_SIZE, LoadMode, WarehouseConfig};
use duckdb::Connection;
use duckdb::types::Value;

use crate::progress::ProgressCallback;
use crate::{WarehouseError, queries, quote_ident};

/// A row that can be bound into an `INSERT`.
pub trait LoadRow {
    /// Column values in the same order as the target column list.
    fn values(&self) -> Vec<Value>;
}

/// A [`LoadRow`] with a fixed target table.
pub trait TableRow: LoadRow {
    /// Target table name.
    const TABLE: &'static str;
    /// Target columns, in [`LoadRow::values`] order.
    const COLUMNS: &'static [&'static str];
}

impl LoadRow for Vec<Value> {
    fn values(&self) -> Vec<Value> {
        self.clone()
    }
}

/// Batch size and write mode for a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Rows per `INSERT`. Zero is treated as one.
    pub batch_size: usize,
    /// Append to or replace the table contents.
    pub mode: LoadMode,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            mode: LoadMode::Append,
        }
    }
}

impl LoadOptions {
    /// Takes batch size and mode from the warehouse config.
    #[must_use]
    pub const fn from_config(config: &WarehouseConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            mode: config.load_mode,
        }
    }

    /// The same options in append mode. Dimension flushes always append.
    #[must_use]
    pub const fn appending(self) -> Self {
        Self {
            batch_size: self.batch_size,
            mode: LoadMode::Append,
        }
    }

    /// Batch size actually used.
    #[must_use]
    pub const fn effective_batch_size(&self) -> usize {
        if self.batch_size == 0 {
            1
        } else {
            self.batch_size
        }
    }
}

/// Tables already emptied during one multi-dataset run.
///
/// Several datasets may target the same table. In replace mode only the
/// first write to a table empties it; later writes in the same run append.
#[derive(Debug, Default)]
pub struct ReplacedTables {
    tables: BTreeSet<String>,
}

impl ReplacedTables {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for the next write to `table`.
    pub fn options_for(&mut self, table: &str, options: &LoadOptions) -> LoadOptions {
        if options.mode == LoadMode::Replace && !self.tables.insert(table.to_string()) {
            options.appending()
        } else {
            *options
        }
    }
}

/// Loads typed rows into their table.
///
/// # Errors
///
/// Returns [`WarehouseError`] if any batch fails.
pub fn load_rows<T: TableRow>(
    conn: &Connection,
    rows: &[T],
    options: &LoadOptions,
    progress: &dyn ProgressCallback,
) -> Result<u64, WarehouseError> {
    bulk_load(conn, T::TABLE, T::COLUMNS, rows, options, progress)
}

/// Writes `rows` into `table` in batches of `options.batch_size`.
///
/// In [`LoadMode::Replace`] the table is emptied once before the first
/// batch, even when `rows` is empty. Returns the number of rows inserted.
///
/// # Errors
///
/// Returns [`WarehouseError::Conversion`] if a row's value count does not
/// match `columns`, or [`WarehouseError::DuckDb`] if a statement fails.
pub fn bulk_load<R: LoadRow>(
    conn: &Connection,
    table: &str,
    columns: &[&str],
    rows: &[R],
    options: &LoadOptions,
    progress: &dyn ProgressCallback,
) -> Result<u64, WarehouseError> {
    if columns.is_empty() {
        return Err(WarehouseError::Conversion {
            message: format!("no columns given for {table}"),
        });
    }

    if options.mode == LoadMode::Replace {
        let deleted = queries::delete_all(conn, table)?;
        log::info!("Replace mode: deleted {deleted} existing rows from {table}");
    }

    if rows.is_empty() {
        return Ok(0);
    }

    let batch_size = options.effective_batch_size();
    let total = rows.len() as u64;
    progress.set_total(total);
    progress.set_message(format!("Loading {table}"));

    let head = format!(
        "INSERT INTO {} ({}) VALUES ",
        quote_ident(table),
        columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ")
    );
    let tuple = format!("({})", vec!["?"; columns.len()].join(", "));

    let mut total_inserted = 0u64;
    let batches = rows.len().div_ceil(batch_size);

    for (batch_idx, chunk) in rows.chunks(batch_size).enumerate() {
        let mut sql = head.clone();
        for i in 0..chunk.len() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str(&tuple);
        }

        let mut stmt = conn.prepare(&sql)?;
        let mut param_idx = 1usize;

        for row in chunk {
            let values = row.values();
            if values.len() != columns.len() {
                return Err(WarehouseError::Conversion {
                    message: format!(
                        "row for {table} has {} values, expected {}",
                        values.len(),
                        columns.len()
                    ),
                });
            }
            for value in &values {
                stmt.raw_bind_parameter(param_idx, value)?;
                param_idx += 1;
            }
        }

        let inserted = stmt.raw_execute()?;
        total_inserted += u64::try_from(inserted).unwrap_or(0);
        progress.inc(chunk.len() as u64);

        log::debug!(
            "{table}: batch {}/{batches} loaded ({} rows)",
            batch_idx + 1,
            chunk.len()
        );
    }

    progress.finish(format!("{table}: {total_inserted} rows"));
    log::info!("Loaded {total_inserted} rows into {table} in {batches} batches");

    Ok(total_inserted)
}
