//! Source to target column renaming.

use airpure_config::{ColumnKind, ColumnMapping};
use airpure_source::{RawRow, RawTable, normalize_column_name};

/// A mapped column that exists in the source table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Target column name.
    pub target: String,
    /// Coercion applied to the cell.
    pub kind: ColumnKind,
    /// Position of the source column.
    pub index: usize,
}

/// Mapping resolved against one table's header.
///
/// Both sides are compared after normalization. Source columns that are
/// not mapped are ignored; mapped columns absent from the source are
/// omitted, never synthesized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    fields: Vec<Field>,
}

impl FieldMap {
    /// Resolves configured mappings against `table`.
    #[must_use]
    pub fn resolve(table: &RawTable, mappings: &[ColumnMapping]) -> Self {
        let mut this = Self::default();
        let mut missing = Vec::new();
        for mapping in mappings {
            match table.column_index(&mapping.source) {
                Some(index) => this.fields.push(Field {
                    target: mapping.target.clone(),
                    kind: mapping.kind,
                    index,
                }),
                None => missing.push(normalize_column_name(&mapping.source)),
            }
        }
        if !missing.is_empty() {
            log::warn!("Source is missing mapped columns: {missing:?}");
        }
        this
    }

    /// Resolves a fixed `(source, target)` list, with every column typed as
    /// text.
    #[must_use]
    pub fn from_pairs(table: &RawTable, pairs: &[(&str, &str)]) -> Self {
        let mappings: Vec<ColumnMapping> = pairs
            .iter()
            .map(|(source, target)| ColumnMapping {
                source: (*source).to_string(),
                target: (*target).to_string(),
                kind: ColumnKind::Text,
            })
            .collect();
        Self::resolve(table, &mappings)
    }

    /// Mapped columns present in the source, in mapping order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Target names of the present columns.
    #[must_use]
    pub fn targets(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.target.as_str()).collect()
    }

    /// Cell of `row` under the target column, or `None` if that target is
    /// not present in the source.
    #[must_use]
    pub fn cell<'a>(&self, row: &RawRow<'a>, target: &str) -> Option<&'a str> {
        let field = self.fields.iter().find(|f| f.target == target)?;
        row.at(field.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], row: &[&str]) -> RawTable {
        RawTable::new(
            &headers.iter().map(|s| (*s).to_string()).collect::<Vec<_>>(),
            vec![row.iter().map(|s| (*s).to_string()).collect()],
        )
    }

    #[test]
    fn matches_case_and_whitespace_insensitively() {
        let t = table(&[" AQI  Value ", "State", "Extra"], &["88", "Goa", "x"]);
        let map = FieldMap::from_pairs(&t, &[("aqi_value", "aqi"), ("STATE", "state_name")]);

        assert_eq!(map.targets(), vec!["aqi", "state_name"]);
        let row = t.iter().next().unwrap();
        assert_eq!(map.cell(&row, "aqi"), Some("88"));
        assert_eq!(map.cell(&row, "state_name"), Some("Goa"));
        assert_eq!(map.cell(&row, "Extra"), None);
    }

    #[test]
    fn absent_source_columns_are_omitted() {
        let t = table(&["state"], &["Goa"]);
        let map = FieldMap::from_pairs(&t, &[("state", "state"), ("note", "note")]);

        assert_eq!(map.targets(), vec!["state"]);
        let row = t.iter().next().unwrap();
        assert_eq!(map.cell(&row, "note"), None);
    }

    #[test]
    fn keeps_configured_kinds() {
        let t = table(&["Cases"], &["3"]);
        let map = FieldMap::resolve(
            &t,
            &[ColumnMapping {
                source: "cases".into(),
                target: "cases".into(),
                kind: ColumnKind::Count,
            }],
        );
        assert_eq!(map.fields()[0].kind, ColumnKind::Count);
        assert_eq!(map.fields()[0].index, 0);
    }
}
