//! Header-row scanner with blank-run termination

use super::address::CellAddress;
use super::dates::format_category;
use super::normalize::classify_cell;
use crate::types::Sheet;

/// Hard cap on columns visited regardless of the blank threshold
pub const MAX_SCAN_COLUMNS: usize = 500;

/// Consecutive blanks that end a scan when the report does not override it
pub const DEFAULT_BLANK_THRESHOLD: usize = 3;

/// Lowest blank threshold honoured; a single gap never ends the data
pub const MIN_BLANK_THRESHOLD: usize = 2;

/// How non-blank cells are turned into values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Month-year labels for dates, raw text otherwise
    Category,
    /// Numeric normalization; unreadable values become null
    Number,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScanValue {
    Label(String),
    Number(Option<f64>),
}

impl ScanValue {
    pub fn as_label(&self) -> Option<&str> {
        match self {
            ScanValue::Label(s) => Some(s),
            ScanValue::Number(_) => None,
        }
    }
}

/// Result of walking one row
#[derive(Debug, Clone, PartialEq)]
pub struct RowScan {
    pub start: CellAddress,
    /// One entry per visited column, including the trailing blank run
    pub values: Vec<Option<ScanValue>>,
    /// Last non-blank column visited, or `start` when the row was empty
    pub last_non_blank: CellAddress,
    found_any: bool,
}

impl RowScan {
    /// Number of columns up to and including the last non-blank one
    pub fn meaningful_len(&self) -> usize {
        if self.found_any {
            (self.last_non_blank.col - self.start.col) as usize + 1
        } else {
            0
        }
    }

    /// Values with the trailing blank run removed
    pub fn trimmed(&self) -> &[Option<ScanValue>] {
        &self.values[..self.meaningful_len()]
    }

    /// Trimmed values as labels; interior blanks become empty strings
    pub fn labels(&self) -> Vec<String> {
        self.trimmed()
            .iter()
            .map(|v| {
                v.as_ref()
                    .and_then(ScanValue::as_label)
                    .unwrap_or_default()
                    .to_string()
            })
            .collect()
    }

    /// "C3:DR3" style span of the meaningful columns
    pub fn range_string(&self) -> String {
        format!("{}:{}", self.start, self.last_non_blank)
    }
}

/// Walk rightward from `start` until `blank_threshold` consecutive blanks.
///
/// The threshold is floored at [`MIN_BLANK_THRESHOLD`] and the walk never
/// visits more than [`MAX_SCAN_COLUMNS`] columns.
pub fn scan(sheet: &Sheet, start: CellAddress, mode: ScanMode, blank_threshold: usize) -> RowScan {
    let threshold = blank_threshold.max(MIN_BLANK_THRESHOLD);
    let mut values = Vec::new();
    let mut consecutive_blanks = 0;
    let mut last_non_blank = start;
    let mut found_any = false;

    for offset in 0..MAX_SCAN_COLUMNS {
        let addr = start.offset_cols(offset);
        if offset > 0 && addr.col == start.offset_cols(offset - 1).col {
            // Ran off the right edge of the sheet
            break;
        }

        match sheet.non_blank(addr) {
            None => {
                consecutive_blanks += 1;
                values.push(None);
            }
            Some(cell) => {
                consecutive_blanks = 0;
                last_non_blank = addr;
                found_any = true;
                let value = match mode {
                    ScanMode::Category => ScanValue::Label(format_category(Some(cell))),
                    ScanMode::Number => ScanValue::Number(classify_cell(Some(cell)).value()),
                };
                values.push(Some(value));
            }
        }

        if consecutive_blanks >= threshold {
            break;
        }
    }

    RowScan {
        start,
        values,
        last_non_blank,
        found_any,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Cell;

    fn row(values: &[Option<f64>]) -> Sheet {
        let mut sheet = Sheet::new("Test");
        for (i, v) in values.iter().enumerate() {
            if let Some(n) = v {
                sheet.set(CellAddress::new(0, i as u32), Cell::number(*n));
            }
        }
        sheet
    }

    #[test]
    fn test_blank_run_stops_before_later_values() {
        let sheet = row(&[Some(1.0), Some(2.0), None, None, None, Some(3.0)]);
        let result = scan(&sheet, CellAddress::new(0, 0), ScanMode::Number, 3);

        assert_eq!(
            result.values,
            vec![
                Some(ScanValue::Number(Some(1.0))),
                Some(ScanValue::Number(Some(2.0))),
                None,
                None,
                None
            ]
        );
        assert_eq!(result.last_non_blank.to_string(), "B1");
        assert_eq!(result.meaningful_len(), 2);
    }

    #[test]
    fn test_threshold_floor_of_two() {
        let sheet = row(&[Some(1.0), None, Some(2.0), None, None, Some(9.0)]);
        let result = scan(&sheet, CellAddress::new(0, 0), ScanMode::Number, 1);
        assert_eq!(result.meaningful_len(), 3);
        assert_eq!(result.values.len(), 5);
    }

    #[test]
    fn test_interior_gap_kept_as_blank_label() {
        let sheet = Sheet::new("S")
            .with_cell("C3", Cell::date(45292.0))
            .with_cell("E3", Cell::date(45352.0));
        let result = scan(&sheet, "C3".parse().unwrap(), ScanMode::Category, 3);
        assert_eq!(result.labels(), vec!["ene-24", "", "mar-24"]);
        assert_eq!(result.range_string(), "C3:E3");
    }

    #[test]
    fn test_all_blank_row() {
        let sheet = Sheet::new("Empty");
        let start: CellAddress = "D4".parse().unwrap();
        let result = scan(&sheet, start, ScanMode::Category, 3);
        assert_eq!(result.meaningful_len(), 0);
        assert_eq!(result.last_non_blank, start);
        assert!(result.labels().is_empty());
        assert_eq!(result.values.len(), 3);
    }

    #[test]
    fn test_leading_blank_still_scans() {
        let sheet = Sheet::new("S").with_cell("B1", Cell::text("x"));
        let result = scan(&sheet, CellAddress::new(0, 0), ScanMode::Category, 3);
        assert_eq!(result.labels(), vec!["", "x"]);
    }

    #[test]
    fn test_hard_cap() {
        let mut sheet = Sheet::new("Wide");
        for col in 0..(MAX_SCAN_COLUMNS as u32 + 50) {
            sheet.set(CellAddress::new(0, col), Cell::number(col as f64));
        }
        let result = scan(&sheet, CellAddress::new(0, 0), ScanMode::Number, 3);
        assert_eq!(result.values.len(), MAX_SCAN_COLUMNS);
        assert_eq!(result.meaningful_len(), MAX_SCAN_COLUMNS);
    }

    #[test]
    fn test_number_mode_coerces_text() {
        let sheet = Sheet::new("S")
            .with_cell("A1", Cell::text("1,5"))
            .with_cell("B1", Cell::text("n/d"));
        let result = scan(&sheet, CellAddress::new(0, 0), ScanMode::Number, 2);
        assert_eq!(result.values[0], Some(ScanValue::Number(Some(1.5))));
        assert_eq!(result.values[1], Some(ScanValue::Number(None)));
    }
}
