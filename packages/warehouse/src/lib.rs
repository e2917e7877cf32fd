#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `DuckDB` warehouse access for the AirPure pipeline.
//!
//! Opens the warehouse file, applies the schema script, bulk-loads rows in
//! fixed-size batches, reads back dimension keys, counts rows, and exports
//! tables to CSV. Everything here is blocking and runs on a single
//! [`duckdb::Connection`].

pub mod db;
pub mod export;
pub mod loader;
pub mod progress;
pub mod queries;
pub mod rows;
pub mod schema;

use std::path::PathBuf;

pub use duckdb::Connection;
pub use duckdb::types::Value;

/// Errors that can occur during warehouse operations.
#[derive(Debug, thiserror::Error)]
pub enum WarehouseError {
    /// `DuckDB` error.
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    /// Filesystem error around the warehouse file, schema script, or an
    /// export directory.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Data conversion error.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Quotes an SQL identifier, doubling any embedded quote characters.
#[must_use]
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
