#![allow(clippy::module_name_repetitions)]

//! Interactive menu for the warehouse loader.
//!
//! Provides a menu-driven interface using `dialoguer` for running the
//! pipeline operations without memorizing subcommands.

use airpure_cli_utils::{IndicatifProgress, MultiProgress};
use airpure_config::{LoadMode, PipelineConfig};
use airpure_warehouse::Connection;
use dialoguer::{Confirm, MultiSelect, Select};

use crate::report;

/// Top-level actions available in the interactive menu.
enum IngestAction {
    FullPipeline,
    LoadStar,
    LoadRaw,
    PopulateDates,
    Verify,
    Summary,
    Export,
    ApplySchema,
}

impl IngestAction {
    const ALL: &[Self] = &[
        Self::FullPipeline,
        Self::LoadStar,
        Self::LoadRaw,
        Self::PopulateDates,
        Self::Verify,
        Self::Summary,
        Self::Export,
        Self::ApplySchema,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::FullPipeline => "Run full pipeline (schema, star load, raw load, verify)",
            Self::LoadStar => "Load star schema",
            Self::LoadRaw => "Load raw tables",
            Self::PopulateDates => "Populate date dimension",
            Self::Verify => "Verify row counts",
            Self::Summary => "Show table counts",
            Self::Export => "Export raw tables to CSV",
            Self::ApplySchema => "Apply warehouse schema",
        }
    }
}

/// Runs the interactive menu, prompting the user to select and configure
/// one pipeline operation.
///
/// # Errors
///
/// Returns an error if the warehouse cannot be opened, a prompt fails, or
/// the selected operation fails.
pub fn run(
    config: &PipelineConfig,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let labels: Vec<&str> = IngestAction::ALL.iter().map(IngestAction::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    let conn = crate::open_warehouse(config)?;

    match IngestAction::ALL[idx] {
        IngestAction::FullPipeline => full_pipeline(&conn, config, multi)?,
        IngestAction::LoadStar => load_star(&conn, config, multi)?,
        IngestAction::LoadRaw => load_raw(&conn, config, multi)?,
        IngestAction::PopulateDates => {
            crate::run_schema(&conn, config)?;
            let bar = IndicatifProgress::records_bar(multi, "Populating dim_date");
            let added = crate::populate_dates(&conn, config, Some(bar))?;
            println!("dim_date: {added} days added");
        }
        IngestAction::Verify => report::print_verify(&crate::verify(&conn, config)),
        IngestAction::Summary => report::print_counts(&crate::table_counts(&conn)),
        IngestAction::Export => {
            report::print_exported(&crate::export_raw_tables(&conn, config)?);
        }
        IngestAction::ApplySchema => report::print_schema(&crate::run_schema(&conn, config)?),
    }

    Ok(())
}

/// Runs every loading step in order and finishes with verification.
fn full_pipeline(
    conn: &Connection,
    config: &PipelineConfig,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = with_load_mode(config)?;
    report::print_schema(&crate::run_schema(conn, &config)?);

    let bar = IndicatifProgress::records_bar(multi, "Star load");
    report::print_star(&crate::load_star(conn, &config, Some(bar))?);

    let bar = IndicatifProgress::records_bar(multi, "Raw load");
    report::print_raw(&crate::load_raw(conn, &config, Some(bar)));

    report::print_verify(&crate::verify(conn, &config));
    Ok(())
}

fn load_star(
    conn: &Connection,
    config: &PipelineConfig,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(config) = select_datasets(config, "Datasets to load into the star schema")? else {
        return Ok(());
    };
    let config = with_load_mode(&config)?;
    crate::run_schema(conn, &config)?;

    let bar = IndicatifProgress::records_bar(multi, "Star load");
    report::print_star(&crate::load_star(conn, &config, Some(bar))?);
    Ok(())
}

fn load_raw(
    conn: &Connection,
    config: &PipelineConfig,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(config) = select_datasets(config, "Datasets to load into raw tables")? else {
        return Ok(());
    };
    let config = with_load_mode(&config)?;
    crate::run_schema(conn, &config)?;

    let bar = IndicatifProgress::records_bar(multi, "Raw load");
    let summary = crate::load_raw(conn, &config, Some(bar));
    report::print_raw(&summary);

    if Confirm::new()
        .with_prompt("Verify row counts now?")
        .default(true)
        .interact()?
    {
        report::print_verify(&crate::verify(conn, &config));
    }
    Ok(())
}

/// Prompts for a subset of the configured datasets. Returns `None` if the
/// user selects nothing.
fn select_datasets(
    config: &PipelineConfig,
    prompt: &str,
) -> Result<Option<PipelineConfig>, Box<dyn std::error::Error>> {
    let labels: Vec<String> = config
        .datasets
        .iter()
        .map(|d| format!("{} ({}, {})", d.id, d.kind, d.file))
        .collect();
    let defaults = vec![true; labels.len()];

    let selected = MultiSelect::new()
        .with_prompt(format!("{prompt} (space=toggle, a=all, enter=confirm)"))
        .items(&labels)
        .defaults(&defaults)
        .interact()?;

    if selected.is_empty() {
        println!("No datasets selected.");
        return Ok(None);
    }

    let mut filtered = config.clone();
    filtered.datasets = selected
        .iter()
        .map(|&i| config.datasets[i].clone())
        .collect();
    Ok(Some(filtered))
}

/// Asks whether to replace existing rows when the config appends.
fn with_load_mode(config: &PipelineConfig) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    let mut config = config.clone();
    if config.warehouse.load_mode == LoadMode::Append
        && Confirm::new()
            .with_prompt("Replace existing rows in the target tables?")
            .default(false)
            .interact()?
    {
        config.warehouse.load_mode = LoadMode::Replace;
    }
    Ok(config)
}
