#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal support for the AirPure loader binary.
//!
//! [`IndicatifProgress`] renders the loader's [`ProgressCallback`] as an
//! `indicatif` bar, and [`init_logger`] routes `log` output through
//! `indicatif-log-bridge` so log lines do not tear the bars.

use std::sync::Arc;
use std::time::Duration;

use airpure_warehouse::progress::ProgressCallback;
use indicatif::{ProgressBar, ProgressStyle};

pub use indicatif::MultiProgress;

/// An `indicatif` [`ProgressBar`] driven by bulk-load batches.
pub struct IndicatifProgress {
    bar: ProgressBar,
    /// Style applied once a table load announces its row total.
    bar_style: ProgressStyle,
}

impl IndicatifProgress {
    /// Creates a bar that spins until the first table load calls
    /// [`ProgressCallback::set_total()`], then shows rows loaded out of
    /// the table's total. Each later table restarts the count.
    #[must_use]
    pub fn records_bar(multi: &MultiProgress, message: &str) -> Arc<dyn ProgressCallback> {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.to_string());

        let bar_style = ProgressStyle::with_template(
            "  {msg} {wide_bar:.cyan/dim} {pos}/{len} rows {percent}% [{eta}]",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");

        Arc::new(Self { bar, bar_style })
    }
}

impl ProgressCallback for IndicatifProgress {
    fn set_total(&self, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(0);
        self.bar.set_style(self.bar_style.clone());
    }

    fn inc(&self, delta: u64) {
        self.bar.inc(delta);
    }

    fn set_message(&self, msg: String) {
        self.bar.set_message(msg);
    }

    fn finish(&self, msg: String) {
        self.bar.finish_with_message(msg);
    }
}

/// Initializes `pretty_env_logger`, filtered by `RUST_LOG`, behind
/// `indicatif-log-bridge`.
///
/// Returns the [`MultiProgress`] that all progress bars must be added to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    // A logger may already be installed, e.g. by a test harness.
    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok();

    log::set_max_level(level);

    multi
}

#[cfg(test)]
mod tests {
    use indicatif::ProgressDrawTarget;

    use super::*;

    fn hidden_progress() -> (IndicatifProgress, ProgressBar) {
        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::hidden());
        let progress = IndicatifProgress {
            bar: bar.clone(),
            bar_style: ProgressStyle::default_bar(),
        };
        (progress, bar)
    }

    #[test]
    fn records_bar_tracks_batches() {
        let (progress, bar) = hidden_progress();

        progress.set_total(10);
        progress.inc(4);
        assert_eq!(bar.length(), Some(10));
        assert_eq!(bar.position(), 4);

        progress.inc(6);
        assert_eq!(bar.position(), 10);

        progress.set_message("fact_aqi_daily".to_string());
        assert_eq!(bar.message(), "fact_aqi_daily");

        progress.finish("done".to_string());
        assert!(bar.is_finished());
        assert_eq!(bar.message(), "done");
    }

    #[test]
    fn next_table_restarts_the_count() {
        let (progress, bar) = hidden_progress();

        progress.set_total(10);
        progress.inc(10);
        progress.set_total(3);

        assert_eq!(bar.length(), Some(3));
        assert_eq!(bar.position(), 0);
    }

    #[test]
    fn records_bar_joins_the_multi_progress() {
        let multi = MultiProgress::with_draw_target(ProgressDrawTarget::hidden());
        let progress = IndicatifProgress::records_bar(&multi, "Loading");

        progress.set_total(2);
        progress.inc(2);
        progress.finish("done".to_string());
        multi.clear().unwrap();
    }

    #[test]
    fn init_logger_twice_is_harmless() {
        let _first = init_logger();
        let _second = init_logger();
    }
}
