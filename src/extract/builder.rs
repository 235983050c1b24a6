//! Report builder: sheet → categories → filter → series → diagnostics
//!
//! `build` never fails. Every problem it meets is recorded as a
//! [`ValidationIssue`] on the returned [`ExtractionResult`], so one broken
//! report never stops the others from rendering.

use super::address::{CellAddress, MAX_COLUMN};
use super::cells::{cell_text, find_pattern, range_text_joined};
use super::dates::format_category;
use super::filter::filter_categories;
use super::scanner::{scan, ScanMode, DEFAULT_BLANK_THRESHOLD};
use super::series::read_fixed;
use crate::config::{ReportConfig, SeriesConfig};
use crate::types::{
    ExtractionResult, ParsedSeries, Sheet, ValidationIssue, Workbook, WorkbookSet,
};
use thiserror::Error;
use tracing::{debug, warn};

/// Share of null points above which a series looks un-recalculated
pub const STALE_NULL_RATIO: f64 = 0.5;

/// Faults while reading the header rows
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScanError {
    #[error("second header row {row2} is the same row as the first header {row1}")]
    CompositeSameRow { row1: CellAddress, row2: CellAddress },

    #[error("header at {start} spans {width} columns, past the last sheet column")]
    BeyondLastColumn { start: CellAddress, width: usize },
}

/// Categories after scanning, composing and filtering
#[derive(Debug, Clone, PartialEq)]
struct HeaderScan {
    start: CellAddress,
    categories: Vec<String>,
    discarded: usize,
    end: CellAddress,
}

/// Resolve a sheet by exact name, then by trimmed case-insensitive name
fn resolve_sheet<'a>(workbook: &'a Workbook, name: &str) -> Option<&'a Sheet> {
    if let Some(sheet) = workbook.sheet(name) {
        return Some(sheet);
    }
    let wanted = name.trim().to_lowercase();
    let found = workbook
        .sheet_names()
        .iter()
        .find(|candidate| candidate.trim().to_lowercase() == wanted)?;
    debug!(configured = name, actual = %found, "resolved sheet by relaxed name match");
    workbook.sheet(found)
}

/// Start of the category row: pattern match if configured, else the fixed cell
fn resolve_category_start(sheet: &Sheet, config: &ReportConfig) -> CellAddress {
    let fallback = config.category_start_cell;
    match config.category_header_pattern.as_deref() {
        Some(pattern) => find_pattern(sheet, pattern, fallback.row).unwrap_or_else(|| {
            debug!(pattern, %fallback, "header pattern not found, using fixed anchor");
            fallback
        }),
        None => fallback,
    }
}

fn scan_header(sheet: &Sheet, config: &ReportConfig) -> Result<HeaderScan, ScanError> {
    let start = resolve_category_start(sheet, config);
    let threshold = config
        .max_consecutive_blanks
        .unwrap_or(DEFAULT_BLANK_THRESHOLD);

    let row = scan(sheet, start, ScanMode::Category, threshold);
    let mut raw = row.labels();

    if let Some(row2) = config.category_start_cell_row2 {
        if row2.row == start.row {
            return Err(ScanError::CompositeSameRow { row1: start, row2 });
        }
        if row2.col as usize + raw.len() > MAX_COLUMN as usize + 1 {
            return Err(ScanError::BeyondLastColumn {
                start: row2,
                width: raw.len(),
            });
        }
        raw = raw
            .iter()
            .enumerate()
            .map(|(i, top)| {
                let bottom = format_category(sheet.get(row2.offset_cols(i)));
                format!("{} {}", top, bottom).trim().to_string()
            })
            .collect();
    }

    let categories = filter_categories(&raw, config.family.is_primary()).to_vec();
    let discarded = raw.len() - categories.len();

    let end = if discarded > 0 {
        start.offset_cols(categories.len().saturating_sub(1))
    } else {
        row.last_non_blank
    };

    Ok(HeaderScan {
        start,
        categories,
        discarded,
        end,
    })
}

/// Display name of a series; falls back to "Serie N"
fn series_name(sheet: &Sheet, series: &SeriesConfig, index: usize) -> String {
    let name = if let Some(addr) = series.name_cell {
        cell_text(sheet, addr)
    } else if let Some(range) = &series.name_range {
        range_text_joined(sheet, range)
    } else {
        String::new()
    };

    let trimmed = name.trim();
    if trimmed.is_empty() {
        format!("Serie {}", index + 1)
    } else {
        trimmed.to_string()
    }
}

/// First value cell of a series.
///
/// With a row-label pattern, the matching row (preferring the configured one)
/// is read from the category start column so values stay aligned.
fn series_start(sheet: &Sheet, series: &SeriesConfig, category_start: CellAddress) -> CellAddress {
    let fallback = series.values_start_cell;
    match series.value_header_pattern.as_deref() {
        Some(pattern) => find_pattern(sheet, pattern, fallback.row)
            .map(|hit| category_start.with_row(hit.row))
            .unwrap_or(fallback),
        None => fallback,
    }
}

/// Extract one report from a workbook
pub fn build(workbook: &Workbook, config: &ReportConfig) -> ExtractionResult {
    let mut result = ExtractionResult::empty(config.id);

    let Some(sheet) = resolve_sheet(workbook, &config.sheet) else {
        warn!(report = config.id, sheet = %config.sheet, "sheet not found");
        result.validation.errors.push(ValidationIssue::SheetNotFound {
            sheet: config.sheet.clone(),
        });
        return result;
    };
    result.validation.sheet_found = true;

    match scan_header(sheet, config) {
        Ok(header) => {
            result.resolved_range = format!("{}:{}", header.start, header.end);
            result.discarded_columns = header.discarded;
            result.categories = header.categories;
            if result.categories.is_empty() {
                result.validation.errors.push(ValidationIssue::EmptyRange {
                    anchor: header.start.to_string(),
                });
            }
            debug!(
                report = config.id,
                range = %result.resolved_range,
                categories = result.categories.len(),
                discarded = result.discarded_columns,
                "categories resolved"
            );
            read_series(sheet, config, header.start, &mut result);
        }
        Err(e) => {
            warn!(report = config.id, error = %e, "category scan failed");
            result
                .validation
                .errors
                .push(ValidationIssue::ScanFailed { cause: e.to_string() });
        }
    }

    result
}

fn read_series(
    sheet: &Sheet,
    config: &ReportConfig,
    category_start: CellAddress,
    result: &mut ExtractionResult,
) {
    let expected = result.categories.len();
    if expected == 0 {
        return;
    }

    let mut total_points = 0;
    let mut coerced = 0;
    let mut stale = Vec::new();

    for (idx, series) in config.series.iter().enumerate() {
        let name = series_name(sheet, series, idx);
        let start = series_start(sheet, series, category_start);
        let read = read_fixed(sheet, start, expected);

        if read.null_ratio() > STALE_NULL_RATIO {
            stale.push(name.clone());
        }
        total_points += expected - read.null_count();
        coerced += read.coerced;

        result.series.push(ParsedSeries {
            name,
            data: read.values,
        });
    }

    if !stale.is_empty() {
        result
            .validation
            .warnings
            .push(ValidationIssue::StaleCalculation { series: stale });
    }

    if total_points > 0 {
        result.validation.has_data = true;
    } else {
        result.validation.errors.push(ValidationIssue::NoNumericData);
    }

    if coerced > 0 {
        result
            .validation
            .warnings
            .push(ValidationIssue::Coercion { count: coerced });
    }
}

/// Extract every report whose workbook is loaded, in configuration order
pub fn build_all(workbooks: &WorkbookSet, reports: &[ReportConfig]) -> Vec<ExtractionResult> {
    reports
        .iter()
        .filter_map(|config| {
            workbooks
                .get(config.family)
                .map(|workbook| build(workbook, config))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Cell, FileFamily};
    use pretty_assertions::assert_eq;

    fn addr(s: &str) -> CellAddress {
        s.parse().unwrap()
    }

    #[test]
    fn test_scan_header_recomputes_end_after_filter() {
        let sheet = Sheet::new("S")
            .with_cell("C3", Cell::date(45292.0))
            .with_cell("D3", Cell::date(45323.0))
            .with_cell("E3", Cell::text("Total"));
        let config = ReportConfig::new(1, FileFamily::Billing, "S", addr("C3"))
            .with_series(SeriesConfig::at(addr("B4"), addr("C4")));
        let header = scan_header(&sheet, &config).unwrap();
        assert_eq!(header.categories, vec!["ene-24", "feb-24"]);
        assert_eq!(header.discarded, 1);
        assert_eq!(header.end, addr("D3"));
    }

    #[test]
    fn test_composite_same_row_is_scan_error() {
        let sheet = Sheet::new("S").with_cell("D3", Cell::text("2024"));
        let mut config = ReportConfig::new(6, FileFamily::Billing, "S", addr("D3"));
        config.category_start_cell_row2 = Some(addr("E3"));
        assert!(matches!(
            scan_header(&sheet, &config),
            Err(ScanError::CompositeSameRow { .. })
        ));
    }

    #[test]
    fn test_series_name_fallback() {
        let sheet = Sheet::new("S");
        let series = SeriesConfig::at(addr("B4"), addr("C4"));
        assert_eq!(series_name(&sheet, &series, 2), "Serie 3");
    }

    #[test]
    fn test_series_start_pattern_aligns_to_category_column() {
        let sheet = Sheet::new("S")
            .with_cell("B9", Cell::text("Contratos"))
            .with_cell("B20", Cell::text("Contratos"));
        let mut series = SeriesConfig::at(addr("B20"), addr("C20"));
        series.value_header_pattern = Some("contratos".into());
        assert_eq!(series_start(&sheet, &series, addr("D3")), addr("D20"));

        series.values_start_cell = addr("C30");
        assert_eq!(series_start(&sheet, &series, addr("D3")), addr("D9"));
    }

    #[test]
    fn test_relaxed_sheet_name() {
        let wb = Workbook::new().with_sheet(Sheet::new("Despacho "));
        assert!(resolve_sheet(&wb, "despacho").is_some());
        assert!(resolve_sheet(&wb, "Perfil").is_none());
    }
}
