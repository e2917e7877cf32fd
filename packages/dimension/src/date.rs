//! Date dimension.
//!
//! Unlike states and cities, dates are not discovered from fact files: the
//! whole calendar horizon is generated up front and fact rows only look
//! dates up.

use airpure_config::CalendarConfig;
use airpure_warehouse::Connection;
use airpure_warehouse::WarehouseError;
use airpure_warehouse::loader::{LoadOptions, load_rows};
use airpure_warehouse::progress::ProgressCallback;
use airpure_warehouse::queries;
use airpure_warehouse_models::DateRow;
use chrono::{Datelike as _, NaiveDate, Weekday};

use crate::SurrogateKeys;

/// Builds the attribute row for one day.
#[must_use]
pub fn date_row(date_id: i64, day: NaiveDate) -> DateRow {
    let weekday = day.weekday();
    DateRow {
        date_id,
        date_value: day,
        year: day.year(),
        quarter: day.month0() / 3 + 1,
        month: day.month(),
        month_name: day.format("%B").to_string(),
        week: day.iso_week().week(),
        day_of_month: day.day(),
        day_of_week: weekday.number_from_monday(),
        day_name: day.format("%A").to_string(),
        is_weekend: matches!(weekday, Weekday::Sat | Weekday::Sun),
    }
}

/// The date dimension's key cache, bounded by the configured horizon.
#[derive(Debug, Clone)]
pub struct DateDimension {
    keys: SurrogateKeys<NaiveDate>,
    horizon: CalendarConfig,
}

impl DateDimension {
    /// Creates an empty dimension over `horizon`.
    #[must_use]
    pub fn new(horizon: CalendarConfig) -> Self {
        Self {
            keys: SurrogateKeys::new(),
            horizon,
        }
    }

    /// Seeds the dimension from `dim_date`. Days stored by earlier runs
    /// keep their keys but only resolve while they lie within `horizon`.
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError`] if the keys cannot be read.
    pub fn load(conn: &Connection, horizon: CalendarConfig) -> Result<Self, WarehouseError> {
        let existing = queries::date_keys(conn)?;
        log::debug!("Loaded {} existing dates", existing.len());
        Ok(Self {
            keys: SurrogateKeys::from_existing(existing.into_iter().map(|(id, day)| (day, id))),
            horizon,
        })
    }

    /// Looks up a date. `None` and dates outside the horizon resolve to
    /// `None`, even when an earlier run stored them.
    #[must_use]
    pub fn lookup(&self, day: Option<NaiveDate>) -> Option<i64> {
        let day = day?;
        if day < self.horizon.start || day > self.horizon.end {
            return None;
        }
        self.keys.lookup(&day)
    }

    /// Number of days known to the dimension, including stored days outside
    /// the horizon.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if the dimension has no days.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Assigns keys to every day of the horizon not yet in the dimension
    /// and returns their rows in date order. Keys continue after the
    /// highest existing key, so a fresh dimension numbers its days `1..`.
    pub fn missing_rows(&mut self) -> Vec<DateRow> {
        let CalendarConfig { start, end } = self.horizon;
        for day in start.iter_days().take_while(|day| *day <= end) {
            self.keys.resolve_or_assign(day);
        }
        self.keys
            .take_pending()
            .into_iter()
            .map(|(day, id)| date_row(id, day))
            .collect()
    }

    /// Appends every missing day of the horizon to `dim_date`. Returns the
    /// number of days added, so a second run over the same horizon adds
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError`] if the load fails.
    pub fn populate(
        &mut self,
        conn: &Connection,
        options: &LoadOptions,
        progress: &dyn ProgressCallback,
    ) -> Result<u64, WarehouseError> {
        let rows = self.missing_rows();
        if rows.is_empty() {
            log::info!(
                "Date dimension already covers {} to {}",
                self.horizon.start,
                self.horizon.end
            );
            return Ok(0);
        }

        let inserted = load_rows(conn, &rows, &options.appending(), progress)?;
        log::info!("Date dimension populated: {inserted} records");
        Ok(inserted)
    }
}
