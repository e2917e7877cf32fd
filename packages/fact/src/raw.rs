//! Raw-table mapping: rename and coerce every row, keep them all.

use airpure_config::{ColumnKind, DatasetConfig};
use airpure_source::RawTable;
use airpure_warehouse::Value;
use airpure_warehouse::rows::{opt_date, opt_double, opt_int, text};

use crate::columns::FieldMap;
use crate::coerce;

/// Rows ready for the bulk loader, with their target column list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRows {
    /// Target columns present in the source, in mapping order.
    pub columns: Vec<String>,
    /// One value per column per source row.
    pub rows: Vec<Vec<Value>>,
}

impl RawRows {
    /// Column names as borrowed strings, for the loader.
    #[must_use]
    pub fn column_refs(&self) -> Vec<&str> {
        self.columns.iter().map(String::as_str).collect()
    }
}

/// Maps a source table through the dataset's configured column mapping.
#[must_use]
pub fn map_raw(table: &RawTable, dataset: &DatasetConfig) -> RawRows {
    let fields = FieldMap::resolve(table, &dataset.columns);

    let rows: Vec<Vec<Value>> = table
        .iter()
        .map(|row| {
            fields
                .fields()
                .iter()
                .map(|field| coerce_cell(row.at(field.index), field.kind, &dataset.date_format))
                .collect()
        })
        .collect();

    RawRows {
        columns: fields.targets().into_iter().map(str::to_string).collect(),
        rows,
    }
}

fn coerce_cell(cell: Option<&str>, kind: ColumnKind, date_format: &str) -> Value {
    match kind {
        ColumnKind::Text => text(coerce::text(cell).as_deref()),
        ColumnKind::Date => opt_date(coerce::date(cell, date_format)),
        ColumnKind::Float => opt_double(coerce::measure(cell)),
        ColumnKind::Integer => opt_int(coerce::calendar_int(cell)),
        ColumnKind::Count => Value::BigInt(coerce::count(cell)),
    }
}
