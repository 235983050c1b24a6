//! Fixed-length numeric row reader

use super::address::CellAddress;
use super::normalize::{classify_cell, Normalized};
use crate::types::Sheet;

/// Values read from one series row
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRead {
    pub values: Vec<Option<f64>>,
    /// Present cells that could not be read as numbers
    pub coerced: usize,
}

impl SeriesRead {
    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }

    /// Share of null points; 0 for an empty read
    pub fn null_ratio(&self) -> f64 {
        if self.values.is_empty() {
            0.0
        } else {
            self.null_count() as f64 / self.values.len() as f64
        }
    }
}

/// Read exactly `length` cells rightward from `start`.
///
/// No blank-run termination: the category count fixes the width.
pub fn read_fixed(sheet: &Sheet, start: CellAddress, length: usize) -> SeriesRead {
    let mut coerced = 0;
    let values = (0..length)
        .map(|offset| {
            let addr = CellAddress::new(start.row, start.col.saturating_add(offset as u32));
            match classify_cell(sheet.get(addr)) {
                Normalized::Value(v) => Some(v),
                Normalized::Missing => None,
                Normalized::Coerced => {
                    coerced += 1;
                    None
                }
            }
        })
        .collect();

    SeriesRead { values, coerced }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Cell;

    #[test]
    fn test_reads_exact_length() {
        let sheet = Sheet::new("S")
            .with_cell("E25", Cell::number(1.0))
            .with_cell("F25", Cell::number(2.0))
            .with_cell("I25", Cell::number(5.0));
        let read = read_fixed(&sheet, "E25".parse().unwrap(), 3);
        assert_eq!(read.values, vec![Some(1.0), Some(2.0), None]);
        assert_eq!(read.coerced, 0);
    }

    #[test]
    fn test_zero_length() {
        let sheet = Sheet::new("S").with_cell("A1", Cell::number(1.0));
        let read = read_fixed(&sheet, CellAddress::new(0, 0), 0);
        assert!(read.values.is_empty());
        assert_eq!(read.null_ratio(), 0.0);
    }

    #[test]
    fn test_counts_coercions() {
        let sheet = Sheet::new("S")
            .with_cell("A1", Cell::error("#N/A"))
            .with_cell("B1", Cell::text("12,5"))
            .with_cell("C1", Cell::text(""))
            .with_cell("D1", Cell::text("pendiente"));
        let read = read_fixed(&sheet, CellAddress::new(0, 0), 4);
        assert_eq!(read.values, vec![None, Some(12.5), None, None]);
        assert_eq!(read.coerced, 2);
        assert_eq!(read.null_ratio(), 0.75);
    }
}
