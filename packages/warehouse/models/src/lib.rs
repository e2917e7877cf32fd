#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Warehouse row types for the AirPure AQI star schema.
//!
//! Dimension rows (`dim_state`, `dim_city`, `dim_date`, `dim_population`)
//! and fact rows (`fact_aqi_daily`, `fact_disease_outbreak`,
//! `fact_vehicle_registration`) as they are written to the warehouse.
//! Natural keys are kept next to the surrogate keys for traceability.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Geographic region a state belongs to.
///
/// Declaration order is the lookup order used when a state name appears
/// in more than one region list.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Region {
    /// Northern states and union territories.
    North,
    /// Southern states and union territories.
    South,
    /// Eastern states and union territories.
    East,
    /// Western states and union territories.
    West,
    /// Central states.
    Central,
    /// The north-eastern states.
    Northeast,
    /// Any state not present in the region lookup.
    Other,
}

impl Region {
    /// Regions that can appear in a lookup table, in lookup order.
    ///
    /// [`Region::Other`] is excluded because it is the fallback.
    #[must_use]
    pub const fn lookup_order() -> &'static [Self] {
        &[
            Self::North,
            Self::South,
            Self::East,
            Self::West,
            Self::Central,
            Self::Northeast,
        ]
    }
}

/// City size classification.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum CityTier {
    /// Largest metropolitan cities.
    #[strum(serialize = "Tier 1")]
    #[serde(rename = "Tier 1")]
    Tier1,
    /// Large regional cities.
    #[strum(serialize = "Tier 2")]
    #[serde(rename = "Tier 2")]
    Tier2,
    /// Everything else.
    #[strum(serialize = "Tier 3")]
    #[serde(rename = "Tier 3")]
    Tier3,
}

/// The kind of dataset a source file holds. Decides which fact mapper and
/// which required-key policy apply to its rows.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FactKind {
    /// Daily AQI readings per city.
    Aqi,
    /// Weekly disease outbreak reports per district.
    Disease,
    /// Monthly vehicle registrations per RTO.
    Vehicle,
    /// Yearly projected urban population per state and gender.
    Population,
}

/// A row of `dim_state`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRow {
    /// Surrogate key.
    pub state_id: i64,
    /// Trimmed state name (natural key).
    pub state_name: String,
    /// Region from the region lookup.
    pub region: Region,
}

/// A row of `dim_city`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityRow {
    /// Surrogate key.
    pub city_id: i64,
    /// Trimmed city name. Together with `state_id` forms the natural key.
    pub city_name: String,
    /// Surrogate key of the owning state.
    pub state_id: i64,
    /// Tier classification.
    pub city_tier: CityTier,
    /// Whether the city is in the metro list.
    pub is_metro: bool,
}

/// A row of `dim_date`: one calendar day with its derived attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRow {
    /// Surrogate key.
    pub date_id: i64,
    /// The calendar day (natural key).
    pub date_value: NaiveDate,
    /// Calendar year.
    pub year: i32,
    /// Quarter, 1-4.
    pub quarter: u32,
    /// Month, 1-12.
    pub month: u32,
    /// English month name, e.g. `"January"`.
    pub month_name: String,
    /// ISO 8601 week number.
    pub week: u32,
    /// Day of the month, 1-31.
    pub day_of_month: u32,
    /// Day of the week, 1 = Monday through 7 = Sunday.
    pub day_of_week: u32,
    /// English day name, e.g. `"Monday"`.
    pub day_name: String,
    /// `true` on Saturday and Sunday.
    pub is_weekend: bool,
}

/// A row of `fact_aqi_daily`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AqiFact {
    /// Date surrogate key.
    pub date_id: i64,
    /// State surrogate key.
    pub state_id: i64,
    /// City surrogate key.
    pub city_id: i64,
    /// Reading date.
    pub date_value: NaiveDate,
    /// State name as it appeared in the source.
    pub state_name: String,
    /// City (area) name as it appeared in the source.
    pub city_name: String,
    /// Number of monitoring stations reporting.
    pub number_of_monitoring_stations: Option<String>,
    /// Comma-separated prominent pollutants.
    pub prominent_pollutants: Option<String>,
    /// AQI value, `None` when the source value is not a valid number.
    pub aqi_value: Option<f64>,
    /// Air quality status label (e.g. `"Moderate"`).
    pub air_quality_status: Option<String>,
    /// Unit of measure.
    pub unit: Option<String>,
    /// Free-form note.
    pub note: Option<String>,
}

/// A row of `fact_disease_outbreak`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiseaseFact {
    /// Reporting year.
    pub year: Option<i32>,
    /// Reporting week.
    pub week: Option<i32>,
    /// Outbreak starting date.
    pub outbreak_starting_date: Option<NaiveDate>,
    /// Reporting date.
    pub reporting_date: Option<NaiveDate>,
    /// State surrogate key.
    pub state_id: i64,
    /// State name as it appeared in the source.
    pub state_name: String,
    /// District name.
    pub district: Option<String>,
    /// Disease or illness name.
    pub disease_illness_name: Option<String>,
    /// Outbreak status.
    pub status: Option<String>,
    /// Reported cases, 0 when the source value is not a valid count.
    pub cases: i64,
    /// Reported deaths, 0 when the source value is not a valid count.
    pub deaths: i64,
    /// Unit of measure.
    pub unit: Option<String>,
    /// Free-form note.
    pub note: Option<String>,
}

/// A row of `fact_vehicle_registration`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleFact {
    /// Registration year.
    pub year: Option<i32>,
    /// Registration month as given by the source.
    pub month: Option<String>,
    /// State surrogate key.
    pub state_id: i64,
    /// State name as it appeared in the source.
    pub state_name: String,
    /// Regional transport office.
    pub rto: Option<String>,
    /// Vehicle class.
    pub vehicle_class: Option<String>,
    /// Fuel type.
    pub fuel: Option<String>,
    /// Number of registrations, 0 when the source value is not a valid count.
    pub value: i64,
    /// Unit of measure.
    pub unit: Option<String>,
    /// Free-form note.
    pub note: Option<String>,
}

/// A row of `dim_population`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationRow {
    /// State surrogate key.
    pub state_id: i64,
    /// Projection year.
    pub year: Option<i32>,
    /// Projection month as given by the source.
    pub month: Option<String>,
    /// Gender the projection applies to.
    pub gender: Option<String>,
    /// Projected population in thousands.
    pub population_thousands: Option<f64>,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use super::*;

    #[test]
    fn region_lookup_order_excludes_other() {
        assert_eq!(Region::lookup_order().len(), 6);
        assert!(!Region::lookup_order().contains(&Region::Other));
    }

    #[test]
    fn city_tier_string_form() {
        assert_eq!(CityTier::Tier1.as_ref(), "Tier 1");
        assert_eq!(CityTier::Tier3.to_string(), "Tier 3");
        assert_eq!(CityTier::from_str("Tier 2").unwrap(), CityTier::Tier2);
    }

    #[test]
    fn fact_kind_snake_case() {
        assert_eq!(FactKind::Aqi.as_ref(), "aqi");
        assert_eq!(FactKind::from_str("population").unwrap(), FactKind::Population);
    }

    #[test]
    fn region_round_trips_through_strings() {
        for region in Region::lookup_order() {
            assert_eq!(Region::from_str(region.as_ref()).unwrap(), *region);
        }
        assert_eq!(Region::Other.to_string(), "Other");
    }
}
