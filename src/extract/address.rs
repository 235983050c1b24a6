//! A1-style address algebra
//!
//! Internally rows and columns are 0-indexed; externally they use the
//! spreadsheet convention (column 0 = "A", row 0 = "1").

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Largest column index Excel accepts (XFD)
pub const MAX_COLUMN: u32 = 16_383;

/// Largest row index Excel accepts (1048576)
pub const MAX_ROW: u32 = 1_048_575;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("empty cell address")]
    Empty,

    #[error("invalid cell address '{0}'")]
    Invalid(String),

    #[error("cell address '{0}' is outside the sheet bounds")]
    OutOfBounds(String),

    #[error("invalid range '{0}'")]
    InvalidRange(String),
}

/// A single cell position, ordered row-major (document order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CellAddress {
    pub row: u32,
    pub col: u32,
}

impl CellAddress {
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Address `offset` columns to the right, saturating at the last column
    pub fn offset_cols(self, offset: usize) -> Self {
        let col = (self.col as u64 + offset as u64).min(MAX_COLUMN as u64) as u32;
        Self { row: self.row, col }
    }

    /// Same column, different row
    pub fn with_row(self, row: u32) -> Self {
        Self { row, col: self.col }
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_to_letters(self.col), self.row + 1)
    }
}

impl FromStr for CellAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_address(s)
    }
}

impl TryFrom<String> for CellAddress {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse_address(&value)
    }
}

impl From<CellAddress> for String {
    fn from(addr: CellAddress) -> Self {
        addr.to_string()
    }
}

/// Rectangular block of cells, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CellRange {
    pub start: CellAddress,
    pub end: CellAddress,
}

impl CellRange {
    pub fn new(start: CellAddress, end: CellAddress) -> Self {
        // Normalise so start is always the top-left corner
        Self {
            start: CellAddress::new(start.row.min(end.row), start.col.min(end.col)),
            end: CellAddress::new(start.row.max(end.row), start.col.max(end.col)),
        }
    }

    /// Every address in the range, row by row
    pub fn cells(&self) -> impl Iterator<Item = CellAddress> + '_ {
        (self.start.row..=self.end.row).flat_map(move |row| {
            (self.start.col..=self.end.col).map(move |col| CellAddress::new(row, col))
        })
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

impl FromStr for CellRange {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.split_once(':') {
            Some((a, b)) => {
                let start = parse_address(a).map_err(|_| AddressError::InvalidRange(s.into()))?;
                let end = parse_address(b).map_err(|_| AddressError::InvalidRange(s.into()))?;
                Ok(CellRange::new(start, end))
            }
            // A lone cell is a 1x1 range
            None => {
                let addr = parse_address(trimmed)?;
                Ok(CellRange::new(addr, addr))
            }
        }
    }
}

impl TryFrom<String> for CellRange {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CellRange> for String {
    fn from(range: CellRange) -> Self {
        range.to_string()
    }
}

/// Convert a 0-based column index to letters (0 → A, 25 → Z, 26 → AA)
pub fn column_to_letters(col: u32) -> String {
    let mut result = String::new();
    let mut n = col as u64 + 1;
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        result.insert(0, (b'A' + rem) as char);
        n = (n - 1) / 26;
    }
    result
}

/// Convert column letters to a 0-based index (A → 0, AA → 26)
pub fn letters_to_column(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    let mut n: u64 = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        n = n * 26 + (ch.to_ascii_uppercase() as u8 - b'A') as u64 + 1;
        if n > MAX_COLUMN as u64 + 1 {
            return None;
        }
    }
    Some((n - 1) as u32)
}

/// Parse "E23", "$E$23" or "e23"
pub fn parse_address(s: &str) -> Result<CellAddress, AddressError> {
    let cleaned: String = s.trim().chars().filter(|c| *c != '$').collect();
    if cleaned.is_empty() {
        return Err(AddressError::Empty);
    }

    let split = cleaned
        .find(|c: char| c.is_ascii_digit())
        .ok_or_else(|| AddressError::Invalid(s.to_string()))?;
    let (letters, digits) = cleaned.split_at(split);

    if letters.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(AddressError::Invalid(s.to_string()));
    }

    let col = letters_to_column(letters).ok_or_else(|| AddressError::OutOfBounds(s.to_string()))?;
    let row: u64 = digits
        .parse()
        .map_err(|_| AddressError::Invalid(s.to_string()))?;
    if row == 0 {
        return Err(AddressError::Invalid(s.to_string()));
    }
    if row - 1 > MAX_ROW as u64 {
        return Err(AddressError::OutOfBounds(s.to_string()));
    }

    Ok(CellAddress::new((row - 1) as u32, col))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_letters() {
        assert_eq!(column_to_letters(0), "A");
        assert_eq!(column_to_letters(25), "Z");
        assert_eq!(column_to_letters(26), "AA");
        assert_eq!(column_to_letters(121), "DR");
        assert_eq!(column_to_letters(MAX_COLUMN), "XFD");
    }

    #[test]
    fn test_letters_to_column() {
        assert_eq!(letters_to_column("A"), Some(0));
        assert_eq!(letters_to_column("dr"), Some(121));
        assert_eq!(letters_to_column("XFD"), Some(MAX_COLUMN));
        assert_eq!(letters_to_column("XFE"), None);
        assert_eq!(letters_to_column(""), None);
    }

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address("E23").unwrap(), CellAddress::new(22, 4));
        assert_eq!(parse_address("$C$3").unwrap(), CellAddress::new(2, 2));
        assert_eq!(parse_address(" a1 ").unwrap(), CellAddress::new(0, 0));
        assert!(matches!(parse_address(""), Err(AddressError::Empty)));
        assert!(parse_address("23").is_err());
        assert!(parse_address("E").is_err());
        assert!(parse_address("E0").is_err());
        assert!(parse_address("E2x").is_err());
    }

    #[test]
    fn test_address_display_roundtrip() {
        let addr = CellAddress::new(62, 5);
        assert_eq!(addr.to_string(), "F63");
        assert_eq!("F63".parse::<CellAddress>().unwrap(), addr);
    }

    #[test]
    fn test_range_parse_and_cells() {
        let range: CellRange = "B5:C5".parse().unwrap();
        let cells: Vec<String> = range.cells().map(|c| c.to_string()).collect();
        assert_eq!(cells, vec!["B5", "C5"]);

        let reversed: CellRange = "C6:B5".parse().unwrap();
        assert_eq!(reversed.to_string(), "B5:C6");

        let single: CellRange = "D4".parse().unwrap();
        assert_eq!(single.start, single.end);
    }

    #[test]
    fn test_address_ordering_is_row_major() {
        let mut addrs = vec![
            CellAddress::new(1, 0),
            CellAddress::new(0, 5),
            CellAddress::new(0, 1),
        ];
        addrs.sort();
        assert_eq!(
            addrs,
            vec![
                CellAddress::new(0, 1),
                CellAddress::new(0, 5),
                CellAddress::new(1, 0)
            ]
        );
    }
}
