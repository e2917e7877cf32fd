//! CSV export of warehouse tables for BI import.

use std::path::{Path, PathBuf};

use duckdb::Connection;

use crate::{WarehouseError, queries, quote_ident};

/// Writes `table` to `<dir>/<table>.csv` with a header row, creating `dir`
/// if needed. Returns the output path and the number of rows written.
///
/// # Errors
///
/// Returns [`WarehouseError`] if the directory cannot be created or the
/// `COPY` fails.
pub fn export_table(
    conn: &Connection,
    table: &str,
    dir: &Path,
) -> Result<(PathBuf, u64), WarehouseError> {
    std::fs::create_dir_all(dir).map_err(|source| WarehouseError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(format!("{table}.csv"));
    let target = path.to_string_lossy().replace('\'', "''");
    let sql = format!(
        "COPY (SELECT * FROM {}) TO '{target}' (HEADER, DELIMITER ',')",
        quote_ident(table)
    );
    conn.execute_batch(&sql)?;

    let rows = queries::table_count(conn, table)?;
    log::info!("Exported {rows} rows from {table} to {}", path.display());
    Ok((path, rows))
}
