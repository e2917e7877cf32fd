#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the AirPure warehouse loader.

use airpure_cli_utils::IndicatifProgress;
use airpure_config::PipelineConfig;
use airpure_ingest::report;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "airpure_ingest",
    about = "Loads AQI, disease, vehicle, and population data into the DuckDB warehouse"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute the warehouse schema script
    Schema,
    /// Populate the date dimension over the configured calendar
    Dates,
    /// Load every dataset into the star schema
    Load,
    /// Load every dataset into its raw table
    LoadRaw,
    /// Compare source file row counts with raw table row counts
    Verify,
    /// Print the row count of every warehouse table
    Summary,
    /// Export the raw tables to CSV
    Export,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = airpure_cli_utils::init_logger();
    let cli = Cli::parse();

    let config = PipelineConfig::load().inspect_err(|e| log::error!("{e}"))?;

    let Some(command) = cli.command else {
        return airpure_ingest::interactive::run(&config, &multi);
    };

    let conn = airpure_ingest::open_warehouse(&config).inspect_err(|e| log::error!("{e}"))?;

    match command {
        Commands::Schema => {
            report::print_schema(&airpure_ingest::run_schema(&conn, &config)?);
        }
        Commands::Dates => {
            airpure_ingest::run_schema(&conn, &config)?;
            let bar = IndicatifProgress::records_bar(&multi, "Populating dim_date");
            let added = airpure_ingest::populate_dates(&conn, &config, Some(bar))?;
            println!("dim_date: {added} days added");
        }
        Commands::Load => {
            airpure_ingest::run_schema(&conn, &config)?;
            let bar = IndicatifProgress::records_bar(&multi, "Star load");
            let summary = airpure_ingest::load_star(&conn, &config, Some(bar))
                .inspect_err(|e| log::error!("Star load failed: {e}"))?;
            report::print_star(&summary);
        }
        Commands::LoadRaw => {
            airpure_ingest::run_schema(&conn, &config)?;
            let bar = IndicatifProgress::records_bar(&multi, "Raw load");
            let summary = airpure_ingest::load_raw(&conn, &config, Some(bar));
            report::print_raw(&summary);
            if summary.failures() > 0 {
                return Err(format!("{} dataset(s) failed to load", summary.failures()).into());
            }
        }
        Commands::Verify => {
            report::print_verify(&airpure_ingest::verify(&conn, &config));
        }
        Commands::Summary => {
            report::print_counts(&airpure_ingest::table_counts(&conn));
        }
        Commands::Export => {
            let exported = airpure_ingest::export_raw_tables(&conn, &config)
                .inspect_err(|e| log::error!("Export failed: {e}"))?;
            report::print_exported(&exported);
        }
    }

    Ok(())
}
