//! [`LoadRow`] and [`TableRow`] implementations for the warehouse models.
//!
//! Dates are bound as `YYYY-MM-DD` text and cast by `DuckDB` on insert.

use airpure_warehouse_models::{
    AqiFact, CityRow, DateRow, DiseaseFact, PopulationRow, StateRow, VehicleFact,
};
use chrono::NaiveDate;
use duckdb::types::Value;

use crate::loader::{LoadRow, TableRow};

/// Binds optional text, mapping `None` to NULL.
#[must_use]
pub fn text(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |s| Value::Text(s.to_string()))
}

/// Binds a date as ISO text.
#[must_use]
pub fn date(value: NaiveDate) -> Value {
    Value::Text(value.format("%Y-%m-%d").to_string())
}

/// Binds an optional date, mapping `None` to NULL.
#[must_use]
pub fn opt_date(value: Option<NaiveDate>) -> Value {
    value.map_or(Value::Null, date)
}

/// Binds an optional `i32`, mapping `None` to NULL.
#[must_use]
pub fn opt_int(value: Option<i32>) -> Value {
    value.map_or(Value::Null, Value::Int)
}

/// Binds an optional `f64`, mapping `None` to NULL.
#[must_use]
pub fn opt_double(value: Option<f64>) -> Value {
    value.map_or(Value::Null, Value::Double)
}

fn uint(value: u32) -> Value {
    Value::BigInt(i64::from(value))
}

impl LoadRow for StateRow {
    fn values(&self) -> Vec<Value> {
        vec![
            Value::BigInt(self.state_id),
            Value::Text(self.state_name.clone()),
            Value::Text(self.region.to_string()),
        ]
    }
}

impl TableRow for StateRow {
    const TABLE: &'static str = "dim_state";
    const COLUMNS: &'static [&'static str] = &["state_id", "state_name", "region"];
}

impl LoadRow for CityRow {
    fn values(&self) -> Vec<Value> {
        vec![
            Value::BigInt(self.city_id),
            Value::Text(self.city_name.clone()),
            Value::BigInt(self.state_id),
            Value::Text(self.city_tier.to_string()),
            Value::Boolean(self.is_metro),
        ]
    }
}

impl TableRow for CityRow {
    const TABLE: &'static str = "dim_city";
    const COLUMNS: &'static [&'static str] =
        &["city_id", "city_name", "state_id", "city_tier", "is_metro"];
}

impl LoadRow for DateRow {
    fn values(&self) -> Vec<Value> {
        vec![
            Value::BigInt(self.date_id),
            date(self.date_value),
            Value::Int(self.year),
            uint(self.quarter),
            uint(self.month),
            Value::Text(self.month_name.clone()),
            uint(self.week),
            uint(self.day_of_month),
            uint(self.day_of_week),
            Value::Text(self.day_name.clone()),
            Value::Boolean(self.is_weekend),
        ]
    }
}

impl TableRow for DateRow {
    const TABLE: &'static str = "dim_date";
    const COLUMNS: &'static [&'static str] = &[
        "date_id",
        "date_value",
        "year",
        "quarter",
        "month",
        "month_name",
        "week",
        "day_of_month",
        "day_of_week",
        "day_name",
        "is_weekend",
    ];
}

impl LoadRow for AqiFact {
    fn values(&self) -> Vec<Value> {
        vec![
            Value::BigInt(self.date_id),
            Value::BigInt(self.state_id),
            Value::BigInt(self.city_id),
            date(self.date_value),
            Value::Text(self.state_name.clone()),
            Value::Text(self.city_name.clone()),
            text(self.number_of_monitoring_stations.as_deref()),
            text(self.prominent_pollutants.as_deref()),
            opt_double(self.aqi_value),
            text(self.air_quality_status.as_deref()),
            text(self.unit.as_deref()),
            text(self.note.as_deref()),
        ]
    }
}

impl TableRow for AqiFact {
    const TABLE: &'static str = "fact_aqi_daily";
    const COLUMNS: &'static [&'static str] = &[
        "date_id",
        "state_id",
        "city_id",
        "date_value",
        "state_name",
        "city_name",
        "number_of_monitoring_stations",
        "prominent_pollutants",
        "aqi_value",
        "air_quality_status",
        "unit",
        "note",
    ];
}

impl LoadRow for DiseaseFact {
    fn values(&self) -> Vec<Value> {
        vec![
            opt_int(self.year),
            opt_int(self.week),
            opt_date(self.outbreak_starting_date),
            opt_date(self.reporting_date),
            Value::BigInt(self.state_id),
            Value::Text(self.state_name.clone()),
            text(self.district.as_deref()),
            text(self.disease_illness_name.as_deref()),
            text(self.status.as_deref()),
            Value::BigInt(self.cases),
            Value::BigInt(self.deaths),
            text(self.unit.as_deref()),
            text(self.note.as_deref()),
        ]
    }
}

impl TableRow for DiseaseFact {
    const TABLE: &'static str = "fact_disease_outbreak";
    const COLUMNS: &'static [&'static str] = &[
        "year",
        "week",
        "outbreak_starting_date",
        "reporting_date",
        "state_id",
        "state_name",
        "district",
        "disease_illness_name",
        "status",
        "cases",
        "deaths",
        "unit",
        "note",
    ];
}

impl LoadRow for VehicleFact {
    fn values(&self) -> Vec<Value> {
        vec![
            opt_int(self.year),
            text(self.month.as_deref()),
            Value::BigInt(self.state_id),
            Value::Text(self.state_name.clone()),
            text(self.rto.as_deref()),
            text(self.vehicle_class.as_deref()),
            text(self.fuel.as_deref()),
            Value::BigInt(self.value),
            text(self.unit.as_deref()),
            text(self.note.as_deref()),
        ]
    }
}

impl TableRow for VehicleFact {
    const TABLE: &'static str = "fact_vehicle_registration";
    const COLUMNS: &'static [&'static str] = &[
        "year",
        "month",
        "state_id",
        "state_name",
        "rto",
        "vehicle_class",
        "fuel",
        "value",
        "unit",
        "note",
    ];
}

impl LoadRow for PopulationRow {
    fn values(&self) -> Vec<Value> {
        vec![
            Value::BigInt(self.state_id),
            opt_int(self.year),
            text(self.month.as_deref()),
            text(self.gender.as_deref()),
            opt_double(self.population_thousands),
        ]
    }
}

impl TableRow for PopulationRow {
    const TABLE: &'static str = "dim_population";
    const COLUMNS: &'static [&'static str] =
        &["state_id", "year", "month", "gender", "population_thousands"];
}
