//! Plain-text summaries printed after each operation.

use airpure_ingest_models::{
    ExportedTable, RawLoadOutcome, RawLoadSummary, StarLoadSummary, TableCount,
};
use airpure_verify::VerifyReport;
use airpure_warehouse::schema::SchemaReport;

fn rule() {
    println!("{}", "-".repeat(72));
}

/// Prints the outcome of a schema run.
pub fn print_schema(report: &SchemaReport) {
    println!(
        "Schema: {} statement(s) executed, {} failed",
        report.executed,
        report.failed()
    );
    for failure in &report.failures {
        println!("  {failure}");
    }
}

/// Prints a star load summary.
pub fn print_star(summary: &StarLoadSummary) {
    println!(
        "Dimensions: {} dates, {} states, {} cities added",
        summary.dates_added, summary.states_added, summary.cities_added
    );
    println!(
        "{:<20} {:<28} {:>10} {:>10} {:>10}",
        "DATASET", "TABLE", "READ", "LOADED", "DROPPED"
    );
    rule();
    for d in &summary.datasets {
        println!(
            "{:<20} {:<28} {:>10} {:>10} {:>10}",
            d.dataset_id, d.table, d.rows_read, d.rows_loaded, d.rows_dropped
        );
    }
    println!("Completed in {:.1}s", summary.duration.as_secs_f64());
}

/// Prints a raw load summary.
pub fn print_raw(summary: &RawLoadSummary) {
    println!("{:<20} {:<28} RESULT", "DATASET", "TABLE");
    rule();
    for d in &summary.datasets {
        let result = match &d.outcome {
            RawLoadOutcome::Loaded { rows } => format!("{rows} rows"),
            RawLoadOutcome::Failed { error } => format!("FAILED: {error}"),
        };
        println!("{:<20} {:<28} {result}", d.dataset_id, d.table);
    }
    println!(
        "Completed in {:.1}s with {} failure(s)",
        summary.duration.as_secs_f64(),
        summary.failures()
    );
}

/// Prints a verification report.
pub fn print_verify(report: &VerifyReport) {
    println!(
        "{:<28} {:>12} {:>12}  STATUS",
        "TABLE", "SOURCE", "WAREHOUSE"
    );
    rule();
    for r in &report.results {
        let count = |c: Option<u64>| c.map_or_else(|| "-".to_string(), |n| n.to_string());
        println!(
            "{:<28} {:>12} {:>12}  {}",
            r.table,
            count(r.source_count),
            count(r.db_count),
            r.status
        );
        if let Some(error) = &r.error {
            println!("  {error}");
        }
    }
    println!("{}/{} tables match", report.matched(), report.results.len());
}

/// Prints per-table row counts.
pub fn print_counts(counts: &[TableCount]) {
    println!("{:<28} {:>12}", "TABLE", "ROWS");
    rule();
    for c in counts {
        match c.rows {
            Some(rows) => println!("{:<28} {rows:>12}", c.table),
            None => println!("{:<28} {:>12}", c.table, "missing"),
        }
    }
}

/// Prints the files written by an export.
pub fn print_exported(exported: &[ExportedTable]) {
    for e in exported {
        println!("{:<28} {:>10} rows -> {}", e.table, e.rows, e.path.display());
    }
}
