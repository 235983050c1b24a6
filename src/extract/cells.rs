//! Single-cell and range text lookups, plus text-pattern anchor search

use super::address::{CellAddress, CellRange};
use crate::types::Sheet;

/// Raw text of one cell, empty when absent
pub fn cell_text(sheet: &Sheet, addr: CellAddress) -> String {
    sheet
        .get(addr)
        .map(|cell| cell.display_text())
        .unwrap_or_default()
}

/// Text of every non-empty cell in `range`, joined with single spaces
pub fn range_text_joined(sheet: &Sheet, range: &CellRange) -> String {
    range
        .cells()
        .filter_map(|addr| sheet.non_blank(addr))
        .map(|cell| cell.display_text())
        .filter(|text| !text.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Find the cell whose text contains `pattern` (case-insensitive).
///
/// A match on `preferred_row` wins; otherwise the first match in document
/// order. Blank patterns never match.
pub fn find_pattern(sheet: &Sheet, pattern: &str, preferred_row: u32) -> Option<CellAddress> {
    let needle = pattern.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    let mut first = None;
    for (addr, cell) in sheet.cells() {
        if cell.is_blank() || !cell.display_text().to_lowercase().contains(&needle) {
            continue;
        }
        if addr.row == preferred_row {
            return Some(*addr);
        }
        first.get_or_insert(*addr);
    }
    first
}
