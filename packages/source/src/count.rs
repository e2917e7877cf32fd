//! Data row counting for verification.
//!
//! Counts are taken straight from the file without decoding or mapping, so
//! they are independent of everything the loader does.

use std::path::Path;

use airpure_config::SourceFormat;
use calamine::{Reader as _, open_workbook_auto};

use crate::SourceError;

/// Counts data rows in a source file, excluding the header row.
///
/// # Errors
///
/// Returns [`SourceError`] if the file cannot be opened or parsed.
pub fn count_data_rows(path: &Path, format: SourceFormat) -> Result<u64, SourceError> {
    match format {
        SourceFormat::Csv => count_csv_rows(path),
        SourceFormat::Excel => count_excel_rows(path),
    }
}

fn count_csv_rows(path: &Path) -> Result<u64, SourceError> {
    let file = std::fs::File::open(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(std::io::BufReader::new(file));

    let mut count = 0_u64;
    for record in reader.byte_records() {
        record.map_err(|source| SourceError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        count += 1;
    }
    Ok(count)
}

fn count_excel_rows(path: &Path) -> Result<u64, SourceError> {
    let sheet_err = |message: String| SourceError::Spreadsheet {
        path: path.to_path_buf(),
        message,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| sheet_err(e.to_string()))?;
    let Some(sheet_name) = workbook.sheet_names().first().cloned() else {
        return Err(sheet_err("workbook has no sheets".to_string()));
    };
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| sheet_err(e.to_string()))?;

    Ok(range.height().saturating_sub(1) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_rows_excluding_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.csv");
        let mut body = String::from("state,value\n");
        for i in 0..100 {
            body.push_str(&format!("S{i},{i}\n"));
        }
        std::fs::write(&path, body).unwrap();

        assert_eq!(count_data_rows(&path, SourceFormat::Csv).unwrap(), 100);
    }

    #[test]
    fn quoted_newlines_count_as_one_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.csv");
        std::fs::write(&path, "state,note\nDelhi,\"line one\nline two\"\nGoa,x\n").unwrap();

        assert_eq!(count_data_rows(&path, SourceFormat::Csv).unwrap(), 2);
    }

    #[test]
    fn header_only_file_has_zero_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.csv");
        std::fs::write(&path, "state,value\n").unwrap();

        assert_eq!(count_data_rows(&path, SourceFormat::Csv).unwrap(), 0);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = count_data_rows(Path::new("/nonexistent/a.csv"), SourceFormat::Csv).unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
    }
}
