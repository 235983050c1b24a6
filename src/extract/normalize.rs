//! Shared numeric coercion used by every numeric read path

use crate::types::{Cell, CellValue};

/// Outcome of coercing one cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Normalized {
    /// Nothing there (absent, blank, empty string)
    Missing,
    /// A usable number
    Value(f64),
    /// Something was there but could not be read as a number
    Coerced,
}

impl Normalized {
    pub fn value(self) -> Option<f64> {
        match self {
            Normalized::Value(v) => Some(v),
            Normalized::Missing | Normalized::Coerced => None,
        }
    }
}

/// Coerce a cell's raw value to a number or null
pub fn normalize(value: &CellValue) -> Option<f64> {
    classify(value).value()
}

/// Same as [`normalize`] but reports whether a present value was dropped
pub fn classify(value: &CellValue) -> Normalized {
    match value {
        CellValue::Blank => Normalized::Missing,
        CellValue::Number(n) | CellValue::Date(n) => {
            if n.is_nan() {
                Normalized::Coerced
            } else {
                Normalized::Value(*n)
            }
        }
        CellValue::Error(_) => Normalized::Coerced,
        CellValue::Text(s) if s.is_empty() => Normalized::Missing,
        CellValue::Text(s) => match normalize_text(s) {
            Some(v) => Normalized::Value(v),
            None => Normalized::Coerced,
        },
    }
}

/// Classify an optional cell (absent cells are missing)
pub fn classify_cell(cell: Option<&Cell>) -> Normalized {
    cell.map_or(Normalized::Missing, |c| classify(&c.value))
}

/// Parse free text such as "1,234.5", "12,5 %" or " 1 200 ".
///
/// Whitespace is removed first. When both separators appear, whichever comes
/// last is the decimal separator and the other groups thousands; a lone comma
/// is a decimal separator. Anything outside `[0-9.-]` is then discarded.
pub fn normalize_text(raw: &str) -> Option<f64> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }

    let last_comma = compact.rfind(',');
    let last_dot = compact.rfind('.');
    let unified = match (last_comma, last_dot) {
        (Some(comma), Some(dot)) if comma < dot => compact.replace(',', ""),
        (Some(_), Some(_)) => compact.replace('.', "").replace(',', "."),
        (Some(_), None) => compact.replace(',', "."),
        _ => compact,
    };

    let cleaned: String = unified
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
