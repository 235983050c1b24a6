//! Workbook loader - binary buffer (.xlsx/.xls/.ods) → in-memory workbook

use crate::error::{ChartError, ChartResult};
use crate::extract::address::CellAddress;
use crate::extract::dates::date_to_serial;
use crate::types::{Cell, CellValue, Sheet, Workbook};
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

/// Default upload size ceiling in megabytes
pub const DEFAULT_MAX_FILE_MB: u64 = 30;

/// Extensions accepted at the upload boundary
pub const ACCEPTED_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Loads workbooks, applying the upload boundary checks for files on disk
#[derive(Debug, Clone)]
pub struct WorkbookLoader {
    max_bytes: u64,
}

impl Default for WorkbookLoader {
    fn default() -> Self {
        Self::with_max_mb(DEFAULT_MAX_FILE_MB)
    }
}

impl WorkbookLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_mb(max_mb: u64) -> Self {
        Self {
            max_bytes: max_mb.saturating_mul(1024 * 1024),
        }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Load a workbook file after checking its extension and size
    pub fn load_path(&self, path: &Path) -> ChartResult<Workbook> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        if !ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
            let expected: Vec<String> = ACCEPTED_EXTENSIONS
                .iter()
                .map(|e| format!(".{}", e))
                .collect();
            return Err(ChartError::Upload(format!(
                "{} is not a spreadsheet (expected one of {})",
                path.display(),
                expected.join(", ")
            )));
        }

        let size = fs::metadata(path)?.len();
        if size > self.max_bytes {
            return Err(ChartError::Upload(format!(
                "{} exceeds the maximum allowed size ({} MB)",
                path.display(),
                self.max_bytes / (1024 * 1024)
            )));
        }

        let bytes = fs::read(path)?;
        info!(path = %path.display(), bytes = bytes.len(), "loading workbook");
        self.load_bytes(&bytes)
    }

    /// Load a workbook from an in-memory buffer (upload or download)
    pub fn load_bytes(&self, bytes: &[u8]) -> ChartResult<Workbook> {
        if bytes.len() as u64 > self.max_bytes {
            return Err(ChartError::Upload(format!(
                "workbook exceeds the maximum allowed size ({} MB)",
                self.max_bytes / (1024 * 1024)
            )));
        }
        load_workbook_bytes(bytes)
    }
}

/// Parse a workbook buffer without size checks
pub fn load_workbook_bytes(bytes: &[u8]) -> ChartResult<Workbook> {
    let mut sheets = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ChartError::Workbook(format!("Failed to open workbook: {}", e)))?;

    let mut workbook = Workbook::new();
    for name in sheets.sheet_names() {
        let range = sheets
            .worksheet_range(&name)
            .map_err(|e| ChartError::Workbook(format!("Failed to read sheet '{}': {}", name, e)))?;
        let sheet = convert_range(&name, &range);
        debug!(sheet = %name, cells = sheet.len(), "sheet loaded");
        workbook.add_sheet(sheet);
    }
    Ok(workbook)
}

/// Re-base a calamine range onto absolute addresses
fn convert_range(name: &str, range: &Range<Data>) -> Sheet {
    let mut sheet = Sheet::new(name);
    let Some((row0, col0)) = range.start() else {
        return sheet;
    };

    for (row, col, data) in range.used_cells() {
        if let Some(value) = convert_data(data) {
            let addr = CellAddress::new(row0 + row as u32, col0 + col as u32);
            sheet.set(
                addr,
                // Date-formatted numbers already arrive as `Data::DateTime`;
                // per-cell number formats are not read.
                Cell {
                    value,
                    format: None,
                },
            );
        }
    }
    sheet
}

/// Map one calamine value onto the tagged cell model
fn convert_data(data: &Data) -> Option<CellValue> {
    let value = match data {
        Data::Empty => return None,
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::Error(e) => CellValue::Error(e.to_string()),
        Data::DateTime(dt) if dt.is_datetime() => CellValue::Date(dt.as_f64()),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) => parse_iso_date(s)
            .and_then(date_to_serial)
            .map(CellValue::Date)
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    };
    Some(value)
}

fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_data_kinds() {
        assert_eq!(convert_data(&Data::Empty), None);
        assert_eq!(convert_data(&Data::Int(7)), Some(CellValue::Number(7.0)));
        assert_eq!(
            convert_data(&Data::Bool(true)),
            Some(CellValue::Text("TRUE".into()))
        );
        assert_eq!(
            convert_data(&Data::String("Perfil".into())),
            Some(CellValue::Text("Perfil".into()))
        );
    }

    #[test]
    fn test_convert_iso_dates() {
        assert_eq!(
            convert_data(&Data::DateTimeIso("2024-01-01".into())),
            Some(CellValue::Date(45292.0))
        );
        assert_eq!(
            convert_data(&Data::DateTimeIso("2024-02-01T00:00:00".into())),
            Some(CellValue::Date(45323.0))
        );
        assert_eq!(
            convert_data(&Data::DateTimeIso("not a date".into())),
            Some(CellValue::Text("not a date".into()))
        );
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        let err = load_workbook_bytes(b"definitely not a spreadsheet").unwrap_err();
        assert!(matches!(err, ChartError::Workbook(_)));
    }

    #[test]
    fn test_size_limit() {
        let loader = WorkbookLoader::with_max_mb(0);
        let err = loader.load_bytes(b"x").unwrap_err();
        assert!(matches!(err, ChartError::Upload(_)));
    }

    #[test]
    fn test_extension_check() {
        let loader = WorkbookLoader::new();
        let err = loader.load_path(Path::new("report.pdf")).unwrap_err();
        assert!(err.to_string().contains("not a spreadsheet"));
        assert!(err
            .to_string()
            .contains(".xlsx, .xlsm, .xlsb, .xls, .ods"));
    }
}
