//! Date detection and the fixed-locale "mmm-yy" label

use crate::types::{Cell, CellValue};
use chrono::{Datelike, Days, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

/// Month abbreviations of the label locale (es), January first
pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "ene", "feb", "mar", "abr", "may", "jun", "jul", "ago", "sep", "oct", "nov", "dic",
];

/// Serial 0 in the 1900 date system. Using Dec 30 absorbs the phantom
/// 1900-02-29 for every serial after February 1900.
fn excel_epoch() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1899, 12, 30)
}

/// Convert a 1900-system serial to a calendar date
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 || serial > 2_958_465.0 {
        return None;
    }
    excel_epoch()?.checked_add_days(Days::new(serial.floor() as u64))
}

/// Convert a calendar date back to its serial
pub fn date_to_serial(date: NaiveDate) -> Option<f64> {
    excel_epoch().map(|epoch| (date - epoch).num_days() as f64)
}

/// "ene-24" style label
pub fn month_year_label(date: NaiveDate) -> String {
    let month = MONTH_ABBREVIATIONS[date.month0() as usize];
    format!("{}-{:02}", month, date.year().rem_euclid(100))
}

fn date_format_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)[dmy]").ok()).as_ref()
}

/// Whether a display format string renders a number as a date
pub fn is_date_format(format: &str) -> bool {
    // Drop quoted literals and bracketed locale/colour tags before looking
    let mut stripped = String::with_capacity(format.len());
    let mut in_quotes = false;
    let mut in_brackets = false;
    for ch in format.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '[' if !in_quotes => in_brackets = true,
            ']' if !in_quotes => in_brackets = false,
            _ if in_quotes || in_brackets => {}
            _ => stripped.push(ch),
        }
    }
    if stripped.eq_ignore_ascii_case("general") {
        return false;
    }
    date_format_regex().is_some_and(|re| re.is_match(&stripped))
}

/// Format a header cell as a category label.
///
/// Date cells, and numbers carrying a date display format, become a
/// month-year label; anything else is its raw value as text.
pub fn format_category(cell: Option<&Cell>) -> String {
    let Some(cell) = cell else {
        return String::new();
    };
    match &cell.value {
        CellValue::Date(serial) => serial_to_date(*serial)
            .map(month_year_label)
            .unwrap_or_default(),
        CellValue::Number(n) if cell.format.as_deref().is_some_and(is_date_format) => {
            match serial_to_date(*n) {
                Some(date) => month_year_label(date),
                None => cell.display_text(),
            }
        }
        _ => cell.display_text(),
    }
}
