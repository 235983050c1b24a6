//! Trailing-column filter for scanned headers

use super::dates::MONTH_ABBREVIATIONS;

/// Does a normalized label look like "ene-24": a month token plus a digit?
fn looks_like_month_year(label: &str) -> bool {
    let has_month = MONTH_ABBREVIATIONS.iter().any(|m| label.contains(m));
    let has_digit = label.chars().any(|c| c.is_ascii_digit());
    has_month && has_digit
}

/// Index of the first label that ends the genuine time series, if any.
///
/// A label containing "total" always cuts. For the primary family, the first
/// non-empty label lacking either a month token or a digit cuts as well.
pub fn cutoff_index<S: AsRef<str>>(categories: &[S], is_primary_family: bool) -> Option<usize> {
    categories.iter().position(|raw| {
        let label = raw.as_ref().trim().to_lowercase();
        if label.contains("total") {
            return true;
        }
        is_primary_family && !label.is_empty() && !looks_like_month_year(&label)
    })
}

/// Prefix of `categories` that precedes the cutoff
pub fn filter_categories<S: AsRef<str>>(categories: &[S], is_primary_family: bool) -> &[S] {
    match cutoff_index(categories, is_primary_family) {
        Some(idx) => &categories[..idx],
        None => categories,
    }
}
