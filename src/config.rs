//! Report configuration: which sheet, which anchors, which series
//!
//! Configurations are plain data loaded once at startup from YAML. The
//! production report set is embedded in the binary; `--config` replaces it.

use crate::error::{ChartError, ChartResult};
use crate::extract::address::{CellAddress, CellRange};
use crate::types::FileFamily;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Production report set
pub const DEFAULT_REPORTS_YAML: &str = include_str!("../reports/default.yaml");

/// Chart rendering style, passed through to the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderType {
    #[default]
    Bar,
    Line,
    Area,
}

/// Stacking hint: a flag, or a named stack group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StackHint {
    Flag(bool),
    Group(String),
}

/// Axis label interval: "auto" or every n-th label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabelInterval {
    Every(u32),
    Named(String),
}

/// Visual overrides that extraction ignores
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayHints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_data_zoom: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_zoom_last_n: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_axis_label_interval: Option<LabelInterval>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_axis_label_rotate: Option<i32>,
}

/// One numeric row of a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesConfig {
    /// Single cell holding the series name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_cell: Option<CellAddress>,
    /// Merged header whose parts are joined with spaces
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_range: Option<CellRange>,
    /// First value cell (fallback when a pattern is configured)
    pub values_start_cell: CellAddress,
    /// Row label text locating the value row
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_header_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render_type: Option<RenderType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<StackHint>,
}

impl SeriesConfig {
    /// Series named by a single cell, values starting at `values`
    pub fn at(name_cell: CellAddress, values: CellAddress) -> Self {
        Self {
            name_cell: Some(name_cell),
            name_range: None,
            values_start_cell: values,
            value_header_pattern: None,
            render_type: None,
            stack: None,
        }
    }
}

/// Static description of one chart extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    pub id: u32,
    pub title: String,
    pub family: FileFamily,
    pub sheet: String,
    pub category_start_cell: CellAddress,
    /// Second header row for two-line composite labels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_start_cell_row2: Option<CellAddress>,
    /// Header text locating the category start instead of the fixed cell
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_header_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_consecutive_blanks: Option<usize>,
    pub series: Vec<SeriesConfig>,
    #[serde(default, rename = "type")]
    pub chart_type: RenderType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<bool>,
    #[serde(default)]
    pub display: DisplayHints,
}

impl ReportConfig {
    /// Minimal report for one sheet and header anchor
    pub fn new(id: u32, family: FileFamily, sheet: impl Into<String>, category_start: CellAddress) -> Self {
        let sheet = sheet.into();
        Self {
            id,
            title: sheet.clone(),
            family,
            sheet,
            category_start_cell: category_start,
            category_start_cell_row2: None,
            category_header_pattern: None,
            max_consecutive_blanks: None,
            series: Vec::new(),
            chart_type: RenderType::Bar,
            stack: None,
            display: DisplayHints::default(),
        }
    }

    pub fn with_series(mut self, series: SeriesConfig) -> Self {
        self.series.push(series);
        self
    }
}

#[derive(Debug, Deserialize)]
struct ReportsFile {
    reports: Vec<ReportConfig>,
}

/// Parse and validate a YAML report list
pub fn parse_reports(yaml: &str) -> ChartResult<Vec<ReportConfig>> {
    let file: ReportsFile = serde_yaml::from_str(yaml)?;
    validate_reports(&file.reports)?;
    Ok(file.reports)
}

/// Load reports from a YAML file
pub fn load_reports(path: &Path) -> ChartResult<Vec<ReportConfig>> {
    let content = fs::read_to_string(path)?;
    parse_reports(&content)
}

/// The embedded production report set
pub fn default_reports() -> ChartResult<Vec<ReportConfig>> {
    parse_reports(DEFAULT_REPORTS_YAML)
}

/// Either the given file or the embedded defaults
pub fn load_reports_or_default(path: Option<&Path>) -> ChartResult<Vec<ReportConfig>> {
    match path {
        Some(p) => load_reports(p),
        None => default_reports(),
    }
}

/// Structural checks that serde cannot express
pub fn validate_reports(reports: &[ReportConfig]) -> ChartResult<()> {
    let mut seen = HashSet::new();
    for report in reports {
        if !seen.insert(report.id) {
            return Err(ChartError::Config(format!(
                "duplicate report id {}",
                report.id
            )));
        }
        if report.sheet.trim().is_empty() {
            return Err(ChartError::Config(format!(
                "report {} has an empty sheet name",
                report.id
            )));
        }
        if report.series.is_empty() {
            return Err(ChartError::Config(format!(
                "report {} ('{}') has no series",
                report.id, report.title
            )));
        }
        if report.max_consecutive_blanks == Some(0) {
            return Err(ChartError::Config(format!(
                "report {}: max_consecutive_blanks must be at least 1",
                report.id
            )));
        }
        for (idx, series) in report.series.iter().enumerate() {
            if series.name_cell.is_some() && series.name_range.is_some() {
                return Err(ChartError::Config(format!(
                    "report {} series {}: name_cell and name_range are mutually exclusive",
                    report.id,
                    idx + 1
                )));
            }
        }
    }
    Ok(())
}
