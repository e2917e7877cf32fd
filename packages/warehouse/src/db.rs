//! Warehouse connection utilities.

use std::path::Path;

use duckdb::Connection;

use crate::WarehouseError;

/// Opens (or creates) the warehouse database file, creating its parent
/// directory if needed.
///
/// # Errors
///
/// Returns [`WarehouseError`] if the directory cannot be created or the
/// database cannot be opened.
pub fn open(path: &Path) -> Result<Connection, WarehouseError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|source| WarehouseError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let conn = Connection::open(path)?;
    log::info!("Opened warehouse {}", path.display());
    Ok(conn)
}

/// Opens a transient in-memory warehouse.
///
/// # Errors
///
/// Returns [`WarehouseError`] if `DuckDB` cannot create the database.
pub fn open_in_memory() -> Result<Connection, WarehouseError> {
    Ok(Connection::open_in_memory()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_missing_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("wh.duckdb");

        let conn = open(&path).unwrap();
        conn.execute_batch("CREATE TABLE t (x INTEGER)").unwrap();
        drop(conn);

        assert!(path.exists());
    }
}
