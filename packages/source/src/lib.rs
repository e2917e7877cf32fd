#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Source file reading for the AirPure pipeline.
//!
//! Loads a delimited text file or a spreadsheet into an in-memory
//! [`RawTable`] of string cells with normalized column names. Typing and
//! coercion happen later, in the fact mapper.

pub mod count;
pub mod parsing;
pub mod reader;

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading a source file.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The file could not be opened or read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The delimited text is malformed.
    #[error("CSV error in {}: {source}", path.display())]
    Csv {
        /// File that was being parsed.
        path: PathBuf,
        /// Underlying parser error.
        source: csv::Error,
    },

    /// The workbook could not be opened or a sheet could not be read.
    #[error("Spreadsheet error in {}: {message}", path.display())]
    Spreadsheet {
        /// Workbook that was being read.
        path: PathBuf,
        /// Description of what went wrong.
        message: String,
    },

    /// The configured encoding label is not recognized.
    #[error("Unknown text encoding '{label}'")]
    UnknownEncoding {
        /// The label from the dataset config.
        label: String,
    },

    /// The file has no header row.
    #[error("{} has no header row", path.display())]
    MissingHeader {
        /// File that was being read.
        path: PathBuf,
    },
}

/// Normalizes a column name: trims it, lowercases it, and replaces every
/// whitespace character with an underscore.
///
/// `" Disease / Illness  Name "` becomes `"disease_/_illness__name"`.
#[must_use]
pub fn normalize_column_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect::<String>()
        .to_lowercase()
}

/// Key two column names are matched on: the name with case, whitespace,
/// and underscore runs ignored, so `"AQI  Value"` matches `"aqi_value"`.
fn column_key(name: &str) -> String {
    name.split(|c: char| c.is_whitespace() || c == '_')
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// An in-memory table of string cells.
///
/// Column names are normalized on construction and every row has exactly
/// as many cells as there are columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Builds a table, normalizing the headers and padding or truncating
    /// each row to the header width.
    #[must_use]
    pub fn new(headers: &[String], rows: Vec<Vec<String>>) -> Self {
        let columns: Vec<String> = headers.iter().map(|h| normalize_column_name(h)).collect();
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Normalized column names, in file order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Data rows, excluding the header.
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the table has no data rows.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Finds a column by name. Lookups are case- and
    /// whitespace-insensitive.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let wanted = column_key(name);
        self.columns.iter().position(|c| column_key(c) == wanted)
    }

    /// Iterates over the rows with by-name cell access.
    pub fn iter(&self) -> impl Iterator<Item = RawRow<'_>> {
        self.rows.iter().map(|cells| RawRow {
            table: self,
            cells,
        })
    }
}

/// A borrowed row of a [`RawTable`].
#[derive(Debug, Clone, Copy)]
pub struct RawRow<'a> {
    table: &'a RawTable,
    cells: &'a [String],
}

impl<'a> RawRow<'a> {
    /// Returns the cell under the named column, or `None` if the table has
    /// no such column.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let idx = self.table.column_index(column)?;
        self.cells.get(idx).map(String::as_str)
    }

    /// Returns the cell at a column position.
    #[must_use]
    pub fn at(&self, idx: usize) -> Option<&'a str> {
        self.cells.get(idx).map(String::as_str)
    }

    /// Returns the trimmed cell under the named column, or `None` if the
    /// column is missing or the cell is blank.
    #[must_use]
    pub fn non_blank(&self, column: &str) -> Option<&'a str> {
        self.get(column).map(str::trim).filter(|s| !s.is_empty())
    }
}
