//! Best-effort schema script execution.
//!
//! The script is split on `;` and each statement runs on its own. A
//! failing statement is logged and counted, and execution moves on to the
//! next one, so a partially applied schema is possible.

use std::path::Path;

use duckdb::Connection;

use crate::WarehouseError;

/// Schema applied when no script path is configured.
pub const DEFAULT_SCHEMA: &str = include_str!("../schema/warehouse.sql");

/// Outcome of running a schema script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaReport {
    /// Statements that ran successfully.
    pub executed: usize,
    /// Statements that failed, with their error messages.
    pub failures: Vec<String>,
}

impl SchemaReport {
    /// Number of failed statements.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Splits a script into executable statements.
///
/// `--` comment lines are removed from each chunk; chunks with nothing
/// left are skipped.
#[must_use]
pub fn split_statements(script: &str) -> Vec<String> {
    script
        .split(';')
        .map(|chunk| {
            chunk
                .lines()
                .filter(|line| !line.trim_start().starts_with("--"))
                .collect::<Vec<_>>()
                .join("\n")
                .trim()
                .to_string()
        })
        .filter(|stmt| !stmt.is_empty())
        .collect()
}

/// Executes every statement of `script`, continuing past failures.
pub fn execute_script(conn: &Connection, script: &str) -> SchemaReport {
    let mut report = SchemaReport::default();

    for stmt in split_statements(script) {
        match conn.execute_batch(&stmt) {
            Ok(()) => report.executed += 1,
            Err(e) => {
                let head = stmt.lines().next().unwrap_or_default();
                log::warn!("Schema statement failed ({head}): {e}");
                report.failures.push(e.to_string());
            }
        }
    }

    log::info!(
        "Schema applied: {} statements executed, {} failed",
        report.executed,
        report.failed()
    );
    report
}

/// Applies the schema script at `path`, or the embedded default when
/// `path` is `None`.
///
/// # Errors
///
/// Returns [`WarehouseError::Io`] if the configured script cannot be read.
/// Statement failures are reported in the [`SchemaReport`], not as errors.
pub fn apply(conn: &Connection, path: Option<&Path>) -> Result<SchemaReport, WarehouseError> {
    let Some(path) = path else {
        return Ok(execute_script(conn, DEFAULT_SCHEMA));
    };

    log::info!("Applying schema from {}", path.display());
    let script = std::fs::read_to_string(path).map_err(|source| WarehouseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(execute_script(conn, &script))
}
