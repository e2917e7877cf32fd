//! Typed fact mappers for the star schema.
//!
//! Required keys per kind: AQI facts need date, state, and city keys;
//! disease, vehicle, and population rows need a state key. The column
//! lists are fixed per kind.

use airpure_source::RawTable;
use airpure_warehouse_models::{AqiFact, DiseaseFact, PopulationRow, VehicleFact};

use crate::columns::FieldMap;
use crate::{Dimensions, MappedFacts, coerce};

/// Source to target columns of `fact_aqi_daily`.
pub const AQI_COLUMNS: &[(&str, &str)] = &[
    ("date", "date_value"),
    ("state", "state_name"),
    ("area", "city_name"),
    ("number_of_monitoring_stations", "number_of_monitoring_stations"),
    ("prominent_pollutants", "prominent_pollutants"),
    ("aqi_value", "aqi_value"),
    ("air_quality_status", "air_quality_status"),
    ("unit", "unit"),
    ("note", "note"),
];

/// Source to target columns of `fact_disease_outbreak`.
pub const DISEASE_COLUMNS: &[(&str, &str)] = &[
    ("year", "year"),
    ("week", "week"),
    ("outbreak_starting_date", "outbreak_starting_date"),
    ("reporting_date", "reporting_date"),
    ("state", "state_name"),
    ("district", "district"),
    ("disease / illness name", "disease_illness_name"),
    ("status", "status"),
    ("cases", "cases"),
    ("deaths", "deaths"),
    ("unit", "unit"),
    ("note", "note"),
];

/// Source to target columns of `fact_vehicle_registration`.
pub const VEHICLE_COLUMNS: &[(&str, &str)] = &[
    ("year", "year"),
    ("month", "month"),
    ("state", "state_name"),
    ("rto", "rto"),
    ("vehicle_class", "vehicle_class"),
    ("fuel", "fuel"),
    ("value", "value"),
    ("unit", "unit"),
    ("note", "note"),
];

/// Source to target columns of `dim_population`.
pub const POPULATION_COLUMNS: &[(&str, &str)] = &[
    ("state", "state_name"),
    ("year", "year"),
    ("month", "month"),
    ("gender", "gender"),
    ("value", "population_thousands"),
];

/// Maps daily AQI readings.
#[must_use]
pub fn map_aqi(table: &RawTable, date_format: &str, dims: Dimensions<'_>) -> MappedFacts<AqiFact> {
    let fields = FieldMap::from_pairs(table, AQI_COLUMNS);
    let mut out = MappedFacts::default();

    for row in table.iter() {
        let cell = |target: &str| fields.cell(&row, target);

        let date_value = coerce::date(cell("date_value"), date_format);
        let state_name = coerce::text(cell("state_name"));
        let city_name = coerce::text(cell("city_name"));

        let state_id = state_name.as_deref().and_then(|s| dims.states.lookup(s));
        let city_id = match (city_name.as_deref(), state_id) {
            (Some(city), Some(state)) => dims.cities.lookup(city, state),
            _ => None,
        };
        let date_id = dims.dates.lookup(date_value);

        let (
            Some(date_id),
            Some(state_id),
            Some(city_id),
            Some(date_value),
            Some(state_name),
            Some(city_name),
        ) = (date_id, state_id, city_id, date_value, state_name, city_name)
        else {
            out.dropped += 1;
            continue;
        };

        out.rows.push(AqiFact {
            date_id,
            state_id,
            city_id,
            date_value,
            state_name,
            city_name,
            number_of_monitoring_stations: coerce::text(cell("number_of_monitoring_stations")),
            prominent_pollutants: coerce::text(cell("prominent_pollutants")),
            aqi_value: coerce::measure(cell("aqi_value")),
            air_quality_status: coerce::text(cell("air_quality_status")),
            unit: coerce::text(cell("unit")),
            note: coerce::text(cell("note")),
        });
    }

    log_outcome("fact_aqi_daily", &out);
    out
}

/// Maps weekly disease outbreak reports.
#[must_use]
pub fn map_disease(
    table: &RawTable,
    date_format: &str,
    dims: Dimensions<'_>,
) -> MappedFacts<DiseaseFact> {
    let fields = FieldMap::from_pairs(table, DISEASE_COLUMNS);
    let mut out = MappedFacts::default();

    for row in table.iter() {
        let cell = |target: &str| fields.cell(&row, target);

        let Some((state_id, state_name)) = resolve_state(cell("state_name"), dims) else {
            out.dropped += 1;
            continue;
        };

        out.rows.push(DiseaseFact {
            year: coerce::calendar_int(cell("year")),
            week: coerce::calendar_int(cell("week")),
            outbreak_starting_date: coerce::date(cell("outbreak_starting_date"), date_format),
            reporting_date: coerce::date(cell("reporting_date"), date_format),
            state_id,
            state_name,
            district: coerce::text(cell("district")),
            disease_illness_name: coerce::text(cell("disease_illness_name")),
            status: coerce::text(cell("status")),
            cases: coerce::count(cell("cases")),
            deaths: coerce::count(cell("deaths")),
            unit: coerce::text(cell("unit")),
            note: coerce::text(cell("note")),
        });
    }

    log_outcome("fact_disease_outbreak", &out);
    out
}

/// Maps monthly vehicle registrations.
#[must_use]
pub fn map_vehicle(table: &RawTable, dims: Dimensions<'_>) -> MappedFacts<VehicleFact> {
    let fields = FieldMap::from_pairs(table, VEHICLE_COLUMNS);
    let mut out = MappedFacts::default();

    for row in table.iter() {
        let cell = |target: &str| fields.cell(&row, target);

        let Some((state_id, state_name)) = resolve_state(cell("state_name"), dims) else {
            out.dropped += 1;
            continue;
        };

        out.rows.push(VehicleFact {
            year: coerce::calendar_int(cell("year")),
            month: coerce::text(cell("month")),
            state_id,
            state_name,
            rto: coerce::text(cell("rto")),
            vehicle_class: coerce::text(cell("vehicle_class")),
            fuel: coerce::text(cell("fuel")),
            value: coerce::count(cell("value")),
            unit: coerce::text(cell("unit")),
            note: coerce::text(cell("note")),
        });
    }

    log_outcome("fact_vehicle_registration", &out);
    out
}

/// Maps population projections.
#[must_use]
pub fn map_population(table: &RawTable, dims: Dimensions<'_>) -> MappedFacts<PopulationRow> {
    let fields = FieldMap::from_pairs(table, POPULATION_COLUMNS);
    let mut out = MappedFacts::default();

    for row in table.iter() {
        let cell = |target: &str| fields.cell(&row, target);

        let Some((state_id, _)) = resolve_state(cell("state_name"), dims) else {
            out.dropped += 1;
            continue;
        };

        out.rows.push(PopulationRow {
            state_id,
            year: coerce::calendar_int(cell("year")),
            month: coerce::text(cell("month")),
            gender: coerce::text(cell("gender")),
            population_thousands: coerce::measure(cell("population_thousands")),
        });
    }

    log_outcome("dim_population", &out);
    out
}

fn resolve_state(cell: Option<&str>, dims: Dimensions<'_>) -> Option<(i64, String)> {
    let name = coerce::text(cell)?;
    let id = dims.states.lookup(&name)?;
    Some((id, name))
}

fn log_outcome<T>(table: &str, out: &MappedFacts<T>) {
    if out.dropped > 0 {
        log::warn!(
            "{table}: dropped {} rows missing a required key",
            out.dropped
        );
    }
    log::info!("{table}: mapped {} rows", out.kept());
}

#[cfg(test)]
mod tests {
    use airpure_config::{CalendarConfig, LookupTables, PipelineConfig};
    use airpure_dimension::{CityDimension, DateDimension, StateDimension};
    use airpure_warehouse::Connection;
    use airpure_warehouse::loader::LoadOptions;
    use airpure_warehouse::progress::NullProgress;
    use airpure_warehouse::schema;
    use chrono::NaiveDate;

    use super::*;
    use crate::keys::{observe_cities, observe_states};

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            &headers.iter().map(|s| (*s).to_string()).collect::<Vec<_>>(),
            rows.iter()
                .map(|r| r.iter().map(|s| (*s).to_string()).collect())
                .collect(),
        )
    }

    struct Fixture {
        states: StateDimension,
        cities: CityDimension,
        dates: DateDimension,
    }

    impl Fixture {
        fn new(source: &RawTable) -> Self {
            let lookups: LookupTables = PipelineConfig::embedded().unwrap().lookups;
            let conn = Connection::open_in_memory().unwrap();
            schema::apply(&conn, None).unwrap();

            let mut dates = DateDimension::load(
                &conn,
                CalendarConfig {
                    start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                    end: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
                },
            )
            .unwrap();
            dates
                .populate(&conn, &LoadOptions::default(), &NullProgress)
                .unwrap();

            let mut states = StateDimension::new(&lookups);
            let mut cities = CityDimension::new(&lookups);
            observe_states(source, "state", &mut states);
            observe_cities(source, "area", "state", &states, &mut cities);

            Self {
                states,
                cities,
                dates,
            }
        }

        fn dims(&self) -> Dimensions<'_> {
            Dimensions {
                states: &self.states,
                cities: &self.cities,
                dates: &self.dates,
            }
        }
    }

    const AQI_HEADERS: &[&str] = &[
        "Date",
        "State",
        "Area",
        "Number Of Monitoring Stations",
        "Prominent Pollutants",
        "AQI Value",
        "Air Quality Status",
        "Unit",
        "Note",
    ];

    #[test]
    fn aqi_rows_join_all_three_keys() {
        let source = table(
            AQI_HEADERS,
            &[
                &["01-01-2024", "Delhi", "Delhi", "38", "PM2.5", "312", "Very Poor", "number", ""],
                &["02-01-2024", "Kerala", "Kochi", "2", "PM10", "NA", "Good", "", ""],
            ],
        );
        let fixture = Fixture::new(&source);

        let mapped = map_aqi(&source, "%d-%m-%Y", fixture.dims());

        assert_eq!(mapped.kept(), 2);
        assert_eq!(mapped.dropped, 0);
        let delhi = &mapped.rows[0];
        assert_eq!(delhi.date_id, 1);
        assert_eq!(delhi.aqi_value, Some(312.0));
        assert_eq!(delhi.number_of_monitoring_stations.as_deref(), Some("38"));
        assert_eq!(delhi.note, None);
        let kochi = &mapped.rows[1];
        assert_eq!(kochi.date_id, 2);
        assert_eq!(kochi.aqi_value, None);
        assert_ne!(kochi.state_id, delhi.state_id);
    }

    #[test]
    fn aqi_rows_missing_a_key_are_dropped() {
        let source = table(
            AQI_HEADERS,
            &[
                &["01-01-2024", "Delhi", "Delhi", "", "", "100", "", "", ""],
                &["not a date", "Delhi", "Delhi", "", "", "100", "", "", ""],
                &["01-01-2030", "Delhi", "Delhi", "", "", "100", "", "", ""],
                &["01-01-2024", "", "Delhi", "", "", "100", "", "", ""],
                &["01-01-2024", "Delhi", "", "", "", "100", "", "", ""],
            ],
        );
        let fixture = Fixture::new(&source);

        let mapped = map_aqi(&source, "%d-%m-%Y", fixture.dims());

        assert_eq!(mapped.kept(), 1);
        assert_eq!(mapped.dropped, 4);
    }

    #[test]
    fn disease_counts_default_to_zero() {
        let source = table(
            &[
                "Year",
                "Week",
                "Outbreak Starting Date",
                "Reporting Date",
                "State",
                "District",
                "Disease / Illness Name",
                "Status",
                "Cases",
                "Deaths",
            ],
            &[
                &["2024", "3", "10-01-2024", "", "Kerala", "Ernakulam", "Dengue", "Under Control", "abc", "12.0"],
                &["2024", "x", "", "", "", "Nowhere", "Cholera", "", "5", "0"],
            ],
        );
        let fixture = Fixture::new(&source);

        let mapped = map_disease(&source, "%d-%m-%Y", fixture.dims());

        assert_eq!(mapped.kept(), 1);
        assert_eq!(mapped.dropped, 1);
        let row = &mapped.rows[0];
        assert_eq!(row.cases, 0);
        assert_eq!(row.deaths, 12);
        assert_eq!(row.week, Some(3));
        assert_eq!(row.disease_illness_name.as_deref(), Some("Dengue"));
        assert_eq!(row.outbreak_starting_date, NaiveDate::from_ymd_opt(2024, 1, 10));
        assert_eq!(row.reporting_date, None);
        assert_eq!(row.unit, None);
    }

    #[test]
    fn vehicle_value_defaults_to_zero() {
        let source = table(
            &["Year", "Month", "State", "RTO", "Vehicle Class", "Fuel", "Value"],
            &[
                &["2024", "January", "Goa", "GA01", "Motor Car", "Electric", "17"],
                &["2024", "February", "Goa", "GA01", "Motor Car", "Electric", "n/a"],
            ],
        );
        let fixture = Fixture::new(&source);

        let mapped = map_vehicle(&source, fixture.dims());

        assert_eq!(mapped.kept(), 2);
        assert_eq!(mapped.rows[0].value, 17);
        assert_eq!(mapped.rows[1].value, 0);
        assert_eq!(mapped.rows[1].month.as_deref(), Some("February"));
    }

    #[test]
    fn population_requires_state_and_keeps_null_measure() {
        let source = table(
            &["State", "Year", "Month", "Gender", "Value"],
            &[
                &["Punjab", "2026", "", "Female", "4410.5"],
                &["Punjab", "2027", "", "Male", "unknown"],
                &["", "2026", "", "Male", "100"],
            ],
        );
        let fixture = Fixture::new(&source);

        let mapped = map_population(&source, fixture.dims());

        assert_eq!(mapped.kept(), 2);
        assert_eq!(mapped.dropped, 1);
        assert_eq!(mapped.rows[0].population_thousands, Some(4410.5));
        assert_eq!(mapped.rows[1].population_thousands, None);
        assert_eq!(mapped.rows[0].month, None);
    }

    #[test]
    fn unobserved_state_is_a_missing_key() {
        let source = table(&["State", "Value"], &[&["Goa", "1"]]);
        let fixture = Fixture::new(&table(&["State"], &[]));

        let mapped = map_vehicle(&source, fixture.dims());

        assert_eq!(mapped.kept(), 0);
        assert_eq!(mapped.dropped, 1);
    }
}
