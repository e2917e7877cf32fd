//! Read queries against the warehouse: dimension keys and row counts.

use airpure_warehouse_models::{CityRow, DateRow, StateRow};
use chrono::NaiveDate;
use duckdb::Connection;

use crate::loader::TableRow as _;
use crate::{WarehouseError, quote_ident};

/// Every table the default schema creates, in summary order.
pub const WAREHOUSE_TABLES: &[&str] = &[
    "dim_state",
    "dim_city",
    "dim_date",
    "dim_population",
    "fact_aqi_daily",
    "fact_disease_outbreak",
    "fact_vehicle_registration",
    "aqi_daily",
    "disease_outbreak",
    "vehicle_registration",
    "population",
];

/// Returns the number of rows in `table`.
///
/// # Errors
///
/// Returns [`WarehouseError`] if the table does not exist or the query
/// fails.
pub fn table_count(conn: &Connection, table: &str) -> Result<u64, WarehouseError> {
    let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
    let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
    u64::try_from(count).map_err(|_| WarehouseError::Conversion {
        message: format!("negative row count {count} for {table}"),
    })
}

/// Deletes every row of `table`, returning how many were removed.
///
/// # Errors
///
/// Returns [`WarehouseError`] if the statement fails.
pub fn delete_all(conn: &Connection, table: &str) -> Result<u64, WarehouseError> {
    let sql = format!("DELETE FROM {}", quote_ident(table));
    let deleted = conn.execute(&sql, [])?;
    Ok(u64::try_from(deleted).unwrap_or(0))
}

/// Returns `(state_id, state_name)` for every `dim_state` row.
///
/// # Errors
///
/// Returns [`WarehouseError`] if the query fails.
pub fn state_keys(conn: &Connection) -> Result<Vec<(i64, String)>, WarehouseError> {
    let sql = format!(
        "SELECT state_id, state_name FROM {} ORDER BY state_id",
        StateRow::TABLE
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Returns `(city_id, city_name, state_id)` for every `dim_city` row.
///
/// # Errors
///
/// Returns [`WarehouseError`] if the query fails.
pub fn city_keys(conn: &Connection) -> Result<Vec<(i64, String, i64)>, WarehouseError> {
    let sql = format!(
        "SELECT city_id, city_name, state_id FROM {} ORDER BY city_id",
        CityRow::TABLE
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Returns `(date_id, date_value)` for every `dim_date` row.
///
/// # Errors
///
/// Returns [`WarehouseError`] if the query fails or a stored date cannot
/// be parsed.
pub fn date_keys(conn: &Connection) -> Result<Vec<(i64, NaiveDate)>, WarehouseError> {
    let sql = format!(
        "SELECT date_id, date_value::TEXT FROM {} ORDER BY date_id",
        DateRow::TABLE
    );
    let mut stmt = conn.prepare(&sql)?;
    let raw = stmt
        .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    raw.into_iter()
        .map(|(id, text)| {
            NaiveDate::parse_from_str(&text, "%Y-%m-%d")
                .map(|d| (id, d))
                .map_err(|e| WarehouseError::Conversion {
                    message: format!("bad date_value {text:?} for date_id {id}: {e}"),
                })
        })
        .collect()
}
