#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Pipeline configuration.
//!
//! Everything that used to be a hard-coded constant of the ETL scripts
//! (warehouse location, source file names, the calendar horizon, the
//! region/tier/metro lookup tables, and the per-dataset column mappings)
//! lives in a [`PipelineConfig`] that is passed explicitly into each
//! component.
//!
//! The default configuration is `pipeline.toml`, baked into the binary via
//! [`include_str!`]. Setting the `AIRPURE_CONFIG` environment variable to a
//! file path replaces it.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::str::FromStr as _;

use airpure_warehouse_models::{FactKind, Region};
use chrono::NaiveDate;
use serde::Deserialize;
use strum_macros::{AsRefStr, Display};
use thiserror::Error;

/// Default configuration embedded at compile time.
const DEFAULT_CONFIG_TOML: &str = include_str!("../pipeline.toml");

/// Environment variable holding the path of an override config file.
pub const CONFIG_ENV_VAR: &str = "AIRPURE_CONFIG";

/// Default number of rows per bulk-load batch.
pub const DEFAULT_BATCH_SIZE: usize = 5_000;

/// Default `chrono` format for dates in the source files (`31-12-2024`).
pub const DEFAULT_DATE_FORMAT: &str = "%d-%m-%Y";

/// Errors that can occur while loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config {}: {source}", path.display())]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The TOML could not be deserialized.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config parsed but is not usable.
    #[error("Invalid config: {message}")]
    Invalid {
        /// Description of what went wrong.
        message: String,
    },
}

/// Complete configuration for one pipeline run.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Warehouse location and loader settings.
    pub warehouse: WarehouseConfig,
    /// Horizon of the date dimension.
    pub calendar: CalendarConfig,
    /// Where the source files live.
    pub sources: SourcesConfig,
    /// Where raw tables are exported to.
    #[serde(default)]
    pub export: ExportConfig,
    /// Static lookup tables for the state and city dimensions.
    pub lookups: LookupTables,
    /// Source datasets, in load order.
    pub datasets: Vec<DatasetConfig>,
}

/// How the bulk loader treats rows already present in a target table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LoadMode {
    /// Append to whatever is already in the table. Re-running a load
    /// duplicates its rows.
    #[default]
    Append,
    /// Delete the table's rows once before the first batch of a run.
    Replace,
}

/// Warehouse location and loader settings.
#[derive(Debug, Clone, Deserialize)]
pub struct WarehouseConfig {
    /// Path of the `DuckDB` database file.
    pub path: PathBuf,
    /// Rows per bulk-load batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Append or replace on load.
    #[serde(default)]
    pub load_mode: LoadMode,
    /// Optional schema script. The embedded schema is used when unset.
    #[serde(default)]
    pub schema_path: Option<PathBuf>,
}

const fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

/// Inclusive date range covered by `dim_date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CalendarConfig {
    /// First day of the horizon.
    pub start: NaiveDate,
    /// Last day of the horizon.
    pub end: NaiveDate,
}

/// Location of the source files.
#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    /// Directory every dataset `file` is resolved against.
    pub base_path: PathBuf,
}

/// Output location for CSV exports.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Directory receiving one `<table>.csv` per raw table.
    pub dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data/export"),
        }
    }
}

/// Static lookup tables for dimension attributes. City lists are matched
/// exactly and case-sensitively.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LookupTables {
    /// Cities flagged as metro.
    #[serde(default)]
    pub metro_cities: Vec<String>,
    /// Tier 1 cities.
    #[serde(default)]
    pub tier1_cities: Vec<String>,
    /// Tier 2 cities. Anything in neither tier list is Tier 3.
    #[serde(default)]
    pub tier2_cities: Vec<String>,
    /// Region name (`"North"`, `"South"`, ...) to member state names.
    #[serde(default)]
    pub regions: BTreeMap<String, Vec<String>>,
}

impl LookupTables {
    /// Returns the region lists in lookup order, skipping regions with no
    /// configured states.
    #[must_use]
    pub fn ordered_regions(&self) -> Vec<(Region, &[String])> {
        Region::lookup_order()
            .iter()
            .filter_map(|region| {
                self.regions
                    .get(region.as_ref())
                    .map(|states| (*region, states.as_slice()))
            })
            .collect()
    }
}

/// File format of a source dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SourceFormat {
    /// Comma-delimited text with a header row.
    Csv,
    /// Spreadsheet workbook; the first sheet is read.
    Excel,
}

/// Target type of a mapped column and the coercion applied to it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ColumnKind {
    /// Kept as text; blank cells become null.
    #[default]
    Text,
    /// Parsed with the dataset's date format; invalid becomes null.
    Date,
    /// Floating point; invalid or negative becomes null.
    Float,
    /// Integer attribute such as a year; invalid becomes null.
    Integer,
    /// Integer measure such as a case count; invalid becomes 0.
    Count,
}

/// One source header to target column mapping.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ColumnMapping {
    /// Source header, matched after normalization.
    pub source: String,
    /// Target column name.
    pub target: String,
    /// Coercion applied to the cell.
    #[serde(default)]
    pub kind: ColumnKind,
}

/// A single source dataset.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    /// Unique identifier, used in logs and reports.
    pub id: String,
    /// Which fact mapper handles the dataset in a star load.
    pub kind: FactKind,
    /// File name relative to [`SourcesConfig::base_path`].
    pub file: String,
    /// File format.
    pub format: SourceFormat,
    /// Text encoding label for delimited files.
    #[serde(default = "default_encoding")]
    pub encoding: String,
    /// `chrono` format for date cells.
    #[serde(default = "default_date_format")]
    pub date_format: String,
    /// Raw table the dataset is loaded into and verified against.
    pub raw_table: String,
    /// Raw-table column mapping.
    pub columns: Vec<ColumnMapping>,
}

fn default_encoding() -> String {
    "utf-8".to_string()
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

impl DatasetConfig {
    /// Resolves the dataset file against the sources directory.
    #[must_use]
    pub fn path(&self, sources: &SourcesConfig) -> PathBuf {
        sources.base_path.join(&self.file)
    }
}

impl PipelineConfig {
    /// Parses and validates a TOML configuration string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the TOML is malformed or fails
    /// validation.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or is invalid.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Returns the configuration embedded in the binary.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the embedded TOML is invalid.
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_toml_str(DEFAULT_CONFIG_TOML)
    }

    /// Loads the configuration named by `AIRPURE_CONFIG`, falling back to
    /// the embedded default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the selected configuration cannot be
    /// read or is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_override(std::env::var(CONFIG_ENV_VAR).ok().as_deref())
    }

    /// Loads `path` if it is set and non-blank, else the embedded default.
    fn load_override(path: Option<&str>) -> Result<Self, ConfigError> {
        match path.map(str::trim) {
            Some(path) if !path.is_empty() => {
                log::info!("Loading pipeline config from {path}");
                Self::from_path(Path::new(path))
            }
            _ => {
                log::debug!("Using embedded pipeline config");
                Self::embedded()
            }
        }
    }

    /// Returns the first dataset of the given kind.
    #[must_use]
    pub fn dataset(&self, kind: FactKind) -> Option<&DatasetConfig> {
        self.datasets.iter().find(|d| d.kind == kind)
    }

    /// Checks cross-field invariants that serde cannot express.
    ///
    /// Dataset ids must be unique. Several datasets may share a kind or a
    /// raw table; their rows accumulate in the shared tables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.calendar.start > self.calendar.end {
            return Err(invalid(format!(
                "calendar start {} is after end {}",
                self.calendar.start, self.calendar.end
            )));
        }

        for name in self.lookups.regions.keys() {
            match Region::from_str(name) {
                Ok(Region::Other) | Err(_) => {
                    return Err(invalid(format!("unknown region '{name}' in lookups")));
                }
                Ok(_) => {}
            }
        }

        let mut ids = BTreeSet::new();
        for dataset in &self.datasets {
            if !ids.insert(dataset.id.as_str()) {
                return Err(invalid(format!("duplicate dataset id '{}'", dataset.id)));
            }
            if dataset.columns.is_empty() {
                return Err(invalid(format!("dataset '{}' maps no columns", dataset.id)));
            }
            if dataset.raw_table.trim().is_empty() {
                return Err(invalid(format!("dataset '{}' has no raw_table", dataset.id)));
            }
        }

        Ok(())
    }
}

fn invalid(message: String) -> ConfigError {
    ConfigError::Invalid { message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_config_is_valid() {
        let config = PipelineConfig::embedded().unwrap();
        assert_eq!(config.datasets.len(), 4);
        assert_eq!(config.warehouse.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.warehouse.load_mode, LoadMode::Append);
        assert_eq!(
            config.calendar.start,
            NaiveDate::from_ymd_opt(2022, 1, 1).unwrap()
        );
        assert_eq!(
            config.calendar.end,
            NaiveDate::from_ymd_opt(2026, 12, 31).unwrap()
        );
    }

    #[test]
    fn embedded_config_covers_every_fact_kind() {
        let config = PipelineConfig::embedded().unwrap();
        for kind in [
            FactKind::Aqi,
            FactKind::Disease,
            FactKind::Vehicle,
            FactKind::Population,
        ] {
            assert!(config.dataset(kind).is_some(), "no dataset for {kind}");
        }
        let disease = config.dataset(FactKind::Disease).unwrap();
        assert_eq!(disease.encoding, "latin-1");
        let population = config.dataset(FactKind::Population).unwrap();
        assert_eq!(population.format, SourceFormat::Excel);
        assert_eq!(population.date_format, DEFAULT_DATE_FORMAT);
    }

    #[test]
    fn regions_come_back_in_lookup_order() {
        let config = PipelineConfig::embedded().unwrap();
        let regions: Vec<Region> = config
            .lookups
            .ordered_regions()
            .iter()
            .map(|(r, _)| *r)
            .collect();
        assert_eq!(regions, Region::lookup_order());
    }

    const MINIMAL: &str = r#"
        [warehouse]
        path = "wh.duckdb"

        [calendar]
        start = "2024-01-01"
        end = "2024-01-31"

        [sources]
        base_path = "in"

        [lookups]

        [[datasets]]
        id = "aqi"
        kind = "aqi"
        file = "aqi.csv"
        format = "csv"
        raw_table = "aqi_daily"
        columns = [{ source = "AQI Value", target = "aqi_value", kind = "float" }]
    "#;

    #[test]
    fn minimal_config_gets_defaults() {
        let config = PipelineConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.warehouse.batch_size, DEFAULT_BATCH_SIZE);
        assert!(config.warehouse.schema_path.is_none());
        assert_eq!(config.datasets[0].encoding, "utf-8");
        assert_eq!(config.datasets[0].columns[0].kind, ColumnKind::Float);
        assert_eq!(
            config.datasets[0].path(&config.sources),
            PathBuf::from("in").join("aqi.csv")
        );
        assert_eq!(config.export.dir, PathBuf::from("data/export"));
    }

    #[test]
    fn rejects_inverted_calendar() {
        let toml = MINIMAL.replace("2024-01-31", "2023-01-31");
        let err = PipelineConfig::from_toml_str(&toml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }), "{err}");
    }

    #[test]
    fn rejects_unknown_region() {
        let toml = MINIMAL.replace("[lookups]", "[lookups]\nregions = { Atlantis = [\"X\"] }");
        let err = PipelineConfig::from_toml_str(&toml).unwrap_err();
        assert!(err.to_string().contains("Atlantis"));
    }

    #[test]
    fn rejects_other_as_configured_region() {
        let toml = MINIMAL.replace("[lookups]", "[lookups]\nregions = { Other = [\"X\"] }");
        assert!(PipelineConfig::from_toml_str(&toml).is_err());
    }

    #[test]
    fn reads_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.toml");
        std::fs::write(&path, MINIMAL).unwrap();
        let config = PipelineConfig::from_path(&path).unwrap();
        assert_eq!(config.warehouse.path, PathBuf::from("wh.duckdb"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = PipelineConfig::from_path(Path::new("/nonexistent/pipeline.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn datasets_may_share_kind_and_raw_table() {
        let second = r#"
        [[datasets]]
        id = "aqi_extra"
        kind = "aqi"
        file = "aqi_extra.csv"
        format = "csv"
        raw_table = "aqi_daily"
        columns = [{ source = "AQI Value", target = "aqi_value", kind = "float" }]
        "#;
        let config = PipelineConfig::from_toml_str(&format!("{MINIMAL}{second}")).unwrap();
        assert_eq!(config.datasets.len(), 2);
        assert_eq!(config.datasets[0].raw_table, config.datasets[1].raw_table);
        assert_eq!(config.dataset(FactKind::Aqi).unwrap().id, "aqi");
    }

    #[test]
    fn rejects_duplicate_dataset_ids() {
        let toml = format!("{MINIMAL}{}", &MINIMAL[MINIMAL.find("[[datasets]]").unwrap()..]);
        let err = PipelineConfig::from_toml_str(&toml).unwrap_err();
        assert!(err.to_string().contains("duplicate dataset id 'aqi'"));
    }

    #[test]
    fn override_path_replaces_embedded_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.toml");
        std::fs::write(&path, MINIMAL).unwrap();
        let padded = format!("  {}  ", path.display());

        let config = PipelineConfig::load_override(Some(&padded)).unwrap();

        assert_eq!(config.datasets.len(), 1);
        assert_eq!(config.warehouse.path, PathBuf::from("wh.duckdb"));
    }

    #[test]
    fn blank_override_falls_back_to_embedded_config() {
        for path in [None, Some(""), Some("   ")] {
            let config = PipelineConfig::load_override(path).unwrap();
            assert_eq!(config.datasets.len(), 4);
        }
    }

    #[test]
    fn unreadable_override_is_an_error() {
        let err = PipelineConfig::load_override(Some("/nonexistent/pipeline.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
