//! Reads CSV files and spreadsheets into a [`RawTable`].
//!
//! Delimited files are decoded with the dataset's configured encoding. A
//! file declared UTF-8 that does not decode cleanly is retried as latin-1,
//! since several government exports are labelled UTF-8 but are not.

use std::path::Path;

use airpure_config::SourceFormat;
use calamine::{Data, Reader as _, open_workbook_auto};
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};

use crate::{RawTable, SourceError};

/// Reads a source file in the given format.
///
/// `encoding` is ignored for spreadsheets.
///
/// # Errors
///
/// Returns [`SourceError`] if the file cannot be read or parsed.
pub fn read_table(
    path: &Path,
    format: SourceFormat,
    encoding: &str,
) -> Result<RawTable, SourceError> {
    let table = match format {
        SourceFormat::Csv => read_csv(path, encoding)?,
        SourceFormat::Excel => read_excel(path)?,
    };

    log::info!(
        "Read {} rows x {} columns from {}",
        table.len(),
        table.columns().len(),
        path.display()
    );
    log::debug!("Columns: {:?}", table.columns());

    Ok(table)
}

/// Reads a comma-delimited file with a header row.
///
/// # Errors
///
/// Returns [`SourceError`] if the file cannot be read, the encoding label
/// is unknown, or the CSV is malformed.
pub fn read_csv(path: &Path, encoding: &str) -> Result<RawTable, SourceError> {
    let bytes = std::fs::read(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let text = decode(&bytes, encoding, path)?;
    parse_csv(&text, path)
}

/// Decodes raw bytes with the encoding named by `label`.
///
/// A leading byte-order mark is honored and stripped.
///
/// # Errors
///
/// Returns [`SourceError::UnknownEncoding`] if `label` is not a known
/// encoding label.
pub fn decode(bytes: &[u8], label: &str, path: &Path) -> Result<String, SourceError> {
    let encoding = encoding_for_label(label).ok_or_else(|| SourceError::UnknownEncoding {
        label: label.to_string(),
    })?;

    let (text, actual, had_errors) = encoding.decode(bytes);

    if had_errors && actual == UTF_8 {
        log::warn!(
            "{} is not valid UTF-8, retrying with latin-1",
            path.display()
        );
        let (text, _, _) = WINDOWS_1252.decode(bytes);
        return Ok(text.into_owned());
    }

    if had_errors {
        log::warn!(
            "{} contains bytes invalid in {}; they were replaced",
            path.display(),
            actual.name()
        );
    }

    Ok(text.into_owned())
}

/// Looks up an encoding by WHATWG label, also accepting the `latin-1` and
/// `latin_1` spellings used by pandas-era configs.
#[must_use]
pub fn encoding_for_label(label: &str) -> Option<&'static Encoding> {
    let label = label.trim();
    if label.eq_ignore_ascii_case("latin-1") || label.eq_ignore_ascii_case("latin_1") {
        return Some(WINDOWS_1252);
    }
    Encoding::for_label(label.as_bytes())
}

fn parse_csv(text: &str, path: &Path) -> Result<RawTable, SourceError> {
    let csv_err = |source| SourceError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.trim().to_owned())
        .collect();

    if headers.iter().all(String::is_empty) {
        return Err(SourceError::MissingHeader {
            path: path.to_path_buf(),
        });
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_err)?;
        rows.push(record.iter().map(|v| v.trim().to_owned()).collect());
    }

    Ok(RawTable::new(&headers, rows))
}

/// Reads the first worksheet of a workbook. The first row is the header.
///
/// # Errors
///
/// Returns [`SourceError`] if the workbook cannot be opened, has no
/// sheets, or the first sheet has no header row.
pub fn read_excel(path: &Path) -> Result<RawTable, SourceError> {
    let sheet_err = |message: String| SourceError::Spreadsheet {
        path: path.to_path_buf(),
        message,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| sheet_err(e.to_string()))?;

    let sheet_names = workbook.sheet_names();
    let Some(sheet_name) = sheet_names.first() else {
        return Err(sheet_err("workbook has no sheets".to_string()));
    };
    log::debug!(
        "Reading sheet '{sheet_name}' (first of {}) from {}",
        sheet_names.len(),
        path.display()
    );

    let range = workbook
        .worksheet_range(sheet_name)
        .map_err(|e| sheet_err(e.to_string()))?;

    let mut sheet_rows = range.rows();
    let Some(header_row) = sheet_rows.next() else {
        return Err(SourceError::MissingHeader {
            path: path.to_path_buf(),
        });
    };

    let headers: Vec<String> = header_row.iter().map(cell_to_string).collect();
    let rows = sheet_rows
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();

    Ok(RawTable::new(&headers, rows))
}

/// Renders a spreadsheet cell as text. Whole floats render without a
/// fractional part so `2011.0` reads back as `2011`.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => format_float(*f),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string().trim().to_string(),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        (f as i64).to_string()
    } else {
        f.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    fn write_file(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(bytes).unwrap();
        path
    }

    #[test]
    fn reads_csv_with_messy_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "aqi.csv",
            b" Date ,State,Area, AQI Value \n01-01-2024,Delhi,Delhi,312\n02-01-2024,Kerala,Kochi,41\n",
        );

        let table = read_table(&path, SourceFormat::Csv, "utf-8").unwrap();
        assert_eq!(table.columns(), ["date", "state", "area", "aqi_value"]);
        assert_eq!(table.len(), 2);
        let first = table.iter().next().unwrap();
        assert_eq!(first.get("AQI Value"), Some("312"));
    }

    #[test]
    fn handles_quoted_fields_and_ragged_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "ragged.csv",
            b"state,prominent_pollutants,note\nDelhi,\"PM2.5, PM10\"\nGoa,O3,x,extra\n",
        );

        let table = read_csv(&path, "utf-8").unwrap();
        let rows: Vec<_> = table.iter().collect();
        assert_eq!(rows[0].get("prominent_pollutants"), Some("PM2.5, PM10"));
        assert_eq!(rows[0].get("note"), Some(""));
        assert_eq!(rows[1].get("note"), Some("x"));
    }

    #[test]
    fn decodes_latin1_files() {
        let dir = tempfile::tempdir().unwrap();
        // "Malária" with a latin-1 encoded `á`.
        let path = write_file(&dir, "disease.csv", b"disease\nMal\xe1ria\n");

        let table = read_csv(&path, "latin-1").unwrap();
        assert_eq!(table.rows()[0][0], "Malária");
    }

    #[test]
    fn accepts_latin1_label_spellings() {
        for label in ["latin-1", "LATIN_1", "latin1", "iso-8859-1", " windows-1252 "] {
            assert_eq!(encoding_for_label(label), Some(WINDOWS_1252), "{label}");
        }
        assert_eq!(encoding_for_label("utf-8"), Some(UTF_8));
        assert_eq!(encoding_for_label("klingon"), None);
    }

    #[test]
    fn falls_back_to_latin1_for_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "disease.csv", b"disease\nMal\xe1ria\n");

        let table = read_csv(&path, "utf-8").unwrap();
        assert_eq!(table.rows()[0][0], "Malária");
    }

    #[test]
    fn strips_utf8_bom_from_first_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "bom.csv", b"\xef\xbb\xbfState\nDelhi\n");

        let table = read_csv(&path, "utf-8").unwrap();
        assert_eq!(table.columns(), ["state"]);
    }

    #[test]
    fn rejects_unknown_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "a.csv", b"a\n1\n");

        let err = read_csv(&path, "klingon").unwrap_err();
        assert!(matches!(err, SourceError::UnknownEncoding { .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_table(Path::new("/nonexistent/a.csv"), SourceFormat::Csv, "utf-8")
            .unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
    }

    #[test]
    fn missing_workbook_is_spreadsheet_error() {
        let err = read_table(Path::new("/nonexistent/a.xlsx"), SourceFormat::Excel, "")
            .unwrap_err();
        assert!(matches!(err, SourceError::Spreadsheet { .. }));
    }

    #[test]
    fn empty_file_has_no_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "empty.csv", b"");

        let err = read_csv(&path, "utf-8").unwrap_err();
        assert!(matches!(err, SourceError::MissingHeader { .. }));
    }

    #[test]
    fn whole_floats_render_as_integers() {
        assert_eq!(cell_to_string(&Data::Float(2011.0)), "2011");
        assert_eq!(cell_to_string(&Data::Float(12.5)), "12.5");
        assert_eq!(cell_to_string(&Data::Int(7)), "7");
        assert_eq!(cell_to_string(&Data::String(" Male ".into())), "Male");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }
}
