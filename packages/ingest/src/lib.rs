#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Library for loading the AirPure source files into the `DuckDB`
//! warehouse.
//!
//! Each public function is one pipeline operation. They all run
//! sequentially against a single [`Connection`] and are shared by the CLI
//! subcommands and the interactive menu.

pub mod interactive;
pub mod report;

use std::sync::Arc;
use std::time::Instant;

use airpure_config::{ConfigError, DatasetConfig, PipelineConfig};
use airpure_dimension::{CityDimension, DateDimension, StateDimension};
use airpure_fact::{
    Dimensions, MappedFacts, map_aqi, map_disease, map_population, map_raw, map_vehicle,
    observe_cities, observe_states,
};
use airpure_ingest_models::{
    ExportedTable, RawLoadOutcome, RawLoadResult, RawLoadSummary, StarLoadResult,
    StarLoadSummary, TableCount,
};
use airpure_source::reader::read_table;
use airpure_source::{RawTable, SourceError};
use airpure_verify::{VerifyReport, raw_targets};
use airpure_warehouse::loader::{LoadOptions, ReplacedTables, TableRow, bulk_load, load_rows};
use airpure_warehouse::progress::{ProgressCallback, null_progress};
use airpure_warehouse::schema::SchemaReport;
use airpure_warehouse::{Connection, WarehouseError, db, export, queries, schema};
use airpure_warehouse_models::FactKind;
use thiserror::Error;

/// Normalized source column holding the state name in every dataset.
pub const STATE_COLUMN: &str = "state";

/// Normalized source column holding the city name in the AQI dataset.
pub const CITY_COLUMN: &str = "area";

/// Errors that abort a pipeline operation.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A source file could not be read.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// A warehouse operation failed.
    #[error(transparent)]
    Warehouse(#[from] WarehouseError),
}

/// Opens the configured warehouse file, creating it if needed.
///
/// # Errors
///
/// Returns [`IngestError::Warehouse`] if the database cannot be opened.
pub fn open_warehouse(config: &PipelineConfig) -> Result<Connection, IngestError> {
    log::info!("Opening warehouse {}", config.warehouse.path.display());
    Ok(db::open(&config.warehouse.path)?)
}

/// Executes the schema script. Statement failures are counted in the
/// report, not raised.
///
/// # Errors
///
/// Returns [`IngestError::Warehouse`] if a configured schema file cannot be
/// read.
pub fn run_schema(conn: &Connection, config: &PipelineConfig) -> Result<SchemaReport, IngestError> {
    let report = schema::apply(conn, config.warehouse.schema_path.as_deref())?;
    if report.failed() > 0 {
        log::warn!(
            "Schema applied with {} failed statement(s) out of {}",
            report.failed(),
            report.executed + report.failed()
        );
    } else {
        log::info!("Schema applied: {} statements", report.executed);
    }
    Ok(report)
}

/// Fills `dim_date` over the configured horizon. Returns the number of
/// days added.
///
/// # Errors
///
/// Returns [`IngestError::Warehouse`] if the existing keys cannot be read
/// or the load fails.
pub fn populate_dates(
    conn: &Connection,
    config: &PipelineConfig,
    progress: Option<Arc<dyn ProgressCallback>>,
) -> Result<u64, IngestError> {
    let progress = progress.unwrap_or_else(null_progress);
    let options = LoadOptions::from_config(&config.warehouse);
    let mut dates = DateDimension::load(conn, config.calendar)?;
    let added = dates.populate(conn, &options, progress.as_ref())?;
    progress.finish(format!("dim_date: {added} days added"));
    Ok(added)
}

/// Loads every dataset into the star schema.
///
/// The date dimension is populated first. Each dataset is then read, its
/// states (and, for AQI, cities) are resolved and flushed, and its facts
/// are mapped and bulk loaded. Rows missing a required key are dropped and
/// counted. In replace mode each fact table is emptied once per run, so
/// datasets sharing a fact table all keep their rows.
///
/// # Errors
///
/// Returns [`IngestError`] if a source file cannot be read or a load
/// fails. Datasets already loaded stay loaded.
pub fn load_star(
    conn: &Connection,
    config: &PipelineConfig,
    progress: Option<Arc<dyn ProgressCallback>>,
) -> Result<StarLoadSummary, IngestError> {
    let start = Instant::now();
    let progress = progress.unwrap_or_else(null_progress);
    let options = LoadOptions::from_config(&config.warehouse);
    log::info!(
        "Star load: {} dataset(s), batch size {}, {} mode",
        config.datasets.len(),
        options.effective_batch_size(),
        options.mode
    );

    let mut dates = DateDimension::load(conn, config.calendar)?;
    let mut states = StateDimension::load(conn, &config.lookups)?;
    let mut cities = CityDimension::load(conn, &config.lookups)?;

    let mut summary = StarLoadSummary {
        dates_added: dates.populate(conn, &options, progress.as_ref())?,
        ..StarLoadSummary::default()
    };

    let mut replaced = ReplacedTables::new();
    for dataset in &config.datasets {
        let table = read_dataset(config, dataset)?;

        observe_states(&table, STATE_COLUMN, &mut states);
        if dataset.kind == FactKind::Aqi {
            observe_cities(&table, CITY_COLUMN, STATE_COLUMN, &states, &mut cities);
        }
        summary.states_added += states.flush(conn, &options, progress.as_ref())?;
        summary.cities_added += cities.flush(conn, &options, progress.as_ref())?;

        let dims = Dimensions {
            states: &states,
            cities: &cities,
            dates: &dates,
        };
        let (target, loaded, dropped) = match dataset.kind {
            FactKind::Aqi => load_facts(
                conn,
                map_aqi(&table, &dataset.date_format, dims),
                &options,
                &mut replaced,
                progress.as_ref(),
            )?,
            FactKind::Disease => load_facts(
                conn,
                map_disease(&table, &dataset.date_format, dims),
                &options,
                &mut replaced,
                progress.as_ref(),
            )?,
            FactKind::Vehicle => load_facts(
                conn,
                map_vehicle(&table, dims),
                &options,
                &mut replaced,
                progress.as_ref(),
            )?,
            FactKind::Population => load_facts(
                conn,
                map_population(&table, dims),
                &options,
                &mut replaced,
                progress.as_ref(),
            )?,
        };

        log::info!(
            "{}: {loaded} rows loaded into {target}, {dropped} dropped",
            dataset.id
        );
        summary.datasets.push(StarLoadResult {
            dataset_id: dataset.id.clone(),
            kind: dataset.kind,
            table: target.to_string(),
            rows_read: table.len() as u64,
            rows_loaded: loaded,
            rows_dropped: dropped,
        });
    }

    summary.duration = start.elapsed();
    progress.finish(format!(
        "Star load complete: {} rows loaded",
        summary.rows_loaded()
    ));
    log::info!(
        "Star load complete in {:.1}s: {} dates, {} states, {} cities added; {} facts loaded, {} dropped",
        summary.duration.as_secs_f64(),
        summary.dates_added,
        summary.states_added,
        summary.cities_added,
        summary.rows_loaded(),
        summary.rows_dropped()
    );
    Ok(summary)
}

fn load_facts<T: TableRow>(
    conn: &Connection,
    facts: MappedFacts<T>,
    options: &LoadOptions,
    replaced: &mut ReplacedTables,
    progress: &dyn ProgressCallback,
) -> Result<(&'static str, u64, u64), WarehouseError> {
    let options = replaced.options_for(T::TABLE, options);
    let loaded = load_rows(conn, &facts.rows, &options, progress)?;
    Ok((T::TABLE, loaded, facts.dropped as u64))
}

/// Loads every dataset, renamed and coerced but otherwise unfiltered, into
/// its raw table.
///
/// A dataset that fails is logged and recorded in the summary, and the
/// run moves on to the next one. In replace mode each raw table is emptied
/// once per run.
pub fn load_raw(
    conn: &Connection,
    config: &PipelineConfig,
    progress: Option<Arc<dyn ProgressCallback>>,
) -> RawLoadSummary {
    let start = Instant::now();
    let progress = progress.unwrap_or_else(null_progress);
    let options = LoadOptions::from_config(&config.warehouse);
    let mut replaced = ReplacedTables::new();

    let datasets = config
        .datasets
        .iter()
        .map(|dataset| {
            let outcome = match load_raw_dataset(
                conn,
                config,
                dataset,
                &options,
                &mut replaced,
                progress.as_ref(),
            ) {
                Ok(rows) => {
                    log::info!("{}: {rows} rows loaded into {}", dataset.id, dataset.raw_table);
                    RawLoadOutcome::Loaded { rows }
                }
                Err(e) => {
                    log::error!("Failed to load {}: {e}", dataset.id);
                    RawLoadOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            };
            RawLoadResult {
                dataset_id: dataset.id.clone(),
                table: dataset.raw_table.clone(),
                outcome,
            }
        })
        .collect();

    let summary = RawLoadSummary {
        datasets,
        duration: start.elapsed(),
    };
    progress.finish(format!(
        "Raw load complete: {} failure(s)",
        summary.failures()
    ));
    summary
}

fn load_raw_dataset(
    conn: &Connection,
    config: &PipelineConfig,
    dataset: &DatasetConfig,
    options: &LoadOptions,
    replaced: &mut ReplacedTables,
    progress: &dyn ProgressCallback,
) -> Result<u64, IngestError> {
    let table = read_dataset(config, dataset)?;
    let raw = map_raw(&table, dataset);
    let options = replaced.options_for(&dataset.raw_table, options);
    Ok(bulk_load(
        conn,
        &dataset.raw_table,
        &raw.column_refs(),
        &raw.rows,
        &options,
        progress,
    )?)
}

fn read_dataset(config: &PipelineConfig, dataset: &DatasetConfig) -> Result<RawTable, IngestError> {
    let path = dataset.path(&config.sources);
    log::info!("Reading {} from {}", dataset.id, path.display());
    Ok(read_table(&path, dataset.format, &dataset.encoding)?)
}

/// Compares source and raw table row counts for every dataset.
#[must_use]
pub fn verify(conn: &Connection, config: &PipelineConfig) -> VerifyReport {
    let report = airpure_verify::verify(conn, &raw_targets(config));
    log::info!(
        "Verification: {}/{} tables match",
        report.matched(),
        report.results.len()
    );
    report
}

/// Counts the rows of every warehouse table. A table that cannot be
/// counted is reported with no count.
#[must_use]
pub fn table_counts(conn: &Connection) -> Vec<TableCount> {
    queries::WAREHOUSE_TABLES
        .iter()
        .map(|table| {
            let rows = match queries::table_count(conn, table) {
                Ok(rows) => Some(rows),
                Err(e) => {
                    log::debug!("Could not count {table}: {e}");
                    None
                }
            };
            TableCount {
                table: (*table).to_string(),
                rows,
            }
        })
        .collect()
}

/// Writes each configured raw table to `<export dir>/<table>.csv`.
///
/// # Errors
///
/// Returns [`IngestError::Warehouse`] if a table cannot be exported.
pub fn export_raw_tables(
    conn: &Connection,
    config: &PipelineConfig,
) -> Result<Vec<ExportedTable>, IngestError> {
    let mut tables: Vec<&str> = Vec::new();
    for dataset in &config.datasets {
        if !tables.contains(&dataset.raw_table.as_str()) {
            tables.push(&dataset.raw_table);
        }
    }

    let mut exported = Vec::with_capacity(tables.len());
    for table in tables {
        let (path, rows) = export::export_table(conn, table, &config.export.dir)?;
        exported.push(ExportedTable {
            table: table.to_string(),
            path,
            rows,
        });
    }
    Ok(exported)
}
