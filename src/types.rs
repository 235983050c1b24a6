use crate::extract::address::CellAddress;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

//==============================================================================
// Workbook Model
//==============================================================================

/// Cached cell value as last computed by the spreadsheet application
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Plain number
    Number(f64),
    /// Date stored as a 1900-system serial number
    Date(f64),
    /// Text (booleans are stored as `TRUE`/`FALSE`)
    Text(String),
    /// Cached formula error such as `#N/A` or `#DIV/0!`
    Error(String),
    /// Explicitly empty cell
    Blank,
}

/// One cell: value plus optional display format string
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    pub format: Option<String>,
}

impl Cell {
    pub fn number(n: f64) -> Self {
        Self {
            value: CellValue::Number(n),
            format: None,
        }
    }

    pub fn date(serial: f64) -> Self {
        Self {
            value: CellValue::Date(serial),
            format: None,
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        Self {
            value: CellValue::Text(s.into()),
            format: None,
        }
    }

    pub fn error(literal: impl Into<String>) -> Self {
        Self {
            value: CellValue::Error(literal.into()),
            format: None,
        }
    }

    pub fn blank() -> Self {
        Self {
            value: CellValue::Blank,
            format: None,
        }
    }

    /// Attach a display format (e.g. "mmm-yy")
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Absent values, `Blank` and the empty string all count as blank
    pub fn is_blank(&self) -> bool {
        match &self.value {
            CellValue::Blank => true,
            CellValue::Text(s) => s.is_empty(),
            CellValue::Number(_) | CellValue::Date(_) | CellValue::Error(_) => false,
        }
    }

    /// Raw value rendered as text (no date formatting)
    pub fn display_text(&self) -> String {
        match &self.value {
            CellValue::Number(n) | CellValue::Date(n) => format_number(*n),
            CellValue::Text(s) | CellValue::Error(s) => s.clone(),
            CellValue::Blank => String::new(),
        }
    }
}

/// Render a number without a trailing ".0" for whole values
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

/// Cells of one worksheet keyed by absolute address
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub name: String,
    cells: BTreeMap<CellAddress, Cell>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
        }
    }

    pub fn get(&self, addr: CellAddress) -> Option<&Cell> {
        self.cells.get(&addr)
    }

    /// `None` for absent or blank cells
    pub fn non_blank(&self, addr: CellAddress) -> Option<&Cell> {
        self.cells.get(&addr).filter(|c| !c.is_blank())
    }

    pub fn set(&mut self, addr: CellAddress, cell: Cell) {
        self.cells.insert(addr, cell);
    }

    /// Builder-style insert using an A1 address, mostly for fixtures
    pub fn with_cell(mut self, addr: &str, cell: Cell) -> Self {
        if let Ok(parsed) = addr.parse() {
            self.cells.insert(parsed, cell);
        }
        self
    }

    /// Iterate cells in document order (row-major)
    pub fn cells(&self) -> impl Iterator<Item = (&CellAddress, &Cell)> {
        self.cells.iter()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Immutable in-memory workbook, created once per loaded buffer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    sheets: BTreeMap<String, Sheet>,
    sheet_order: Vec<String>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sheet(&mut self, sheet: Sheet) {
        if !self.sheets.contains_key(&sheet.name) {
            self.sheet_order.push(sheet.name.clone());
        }
        self.sheets.insert(sheet.name.clone(), sheet);
    }

    pub fn with_sheet(mut self, sheet: Sheet) -> Self {
        self.add_sheet(sheet);
        self
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.get(name)
    }

    /// Sheet names in workbook order
    pub fn sheet_names(&self) -> &[String] {
        &self.sheet_order
    }
}

//==============================================================================
// File Families
//==============================================================================

/// The two spreadsheet families fed to the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFamily {
    /// Primary family (monthly billing workbook)
    #[serde(alias = "facturacion", alias = "primary")]
    Billing,
    /// Secondary family (energy balance workbook)
    #[serde(alias = "secondary")]
    Balance,
}

impl FileFamily {
    pub const ALL: [FileFamily; 2] = [FileFamily::Billing, FileFamily::Balance];

    /// Whether the date-shape cutoff applies to this family's headers
    pub fn is_primary(self) -> bool {
        matches!(self, FileFamily::Billing)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FileFamily::Billing => "billing",
            FileFamily::Balance => "balance",
        }
    }
}

impl fmt::Display for FileFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FileFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "billing" | "facturacion" | "primary" => Ok(FileFamily::Billing),
            "balance" | "secondary" => Ok(FileFamily::Balance),
            other => Err(format!(
                "unknown file family '{}' (expected billing or balance)",
                other
            )),
        }
    }
}

/// At most one loaded workbook per family
#[derive(Debug, Clone, Default)]
pub struct WorkbookSet {
    pub billing: Option<Workbook>,
    pub balance: Option<Workbook>,
}

impl WorkbookSet {
    pub fn get(&self, family: FileFamily) -> Option<&Workbook> {
        match family {
            FileFamily::Billing => self.billing.as_ref(),
            FileFamily::Balance => self.balance.as_ref(),
        }
    }

    /// Replace the workbook of one family, superseding the old one
    pub fn set(&mut self, family: FileFamily, workbook: Workbook) {
        match family {
            FileFamily::Billing => self.billing = Some(workbook),
            FileFamily::Balance => self.balance = Some(workbook),
        }
    }

    pub fn is_loaded(&self, family: FileFamily) -> bool {
        self.get(family).is_some()
    }
}

//==============================================================================
// Extraction Output
//==============================================================================

/// A diagnostic attached to an extraction result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationIssue {
    SheetNotFound { sheet: String },
    EmptyRange { anchor: String },
    NoNumericData,
    StaleCalculation { series: Vec<String> },
    Coercion { count: usize },
    ScanFailed { cause: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::SheetNotFound { sheet } => {
                write!(f, "sheet \"{}\" does not exist", sheet)
            }
            ValidationIssue::EmptyRange { anchor } => {
                write!(f, "empty or no valid dates in range starting at {}", anchor)
            }
            ValidationIssue::NoNumericData => {
                write!(f, "no numeric data found in the detected ranges")
            }
            ValidationIssue::StaleCalculation { series } => write!(
                f,
                "many empty values in {} (possibly missing calculated values); open the workbook, recalculate and save it",
                series.join(", ")
            ),
            ValidationIssue::Coercion { count } => write!(
                f,
                "{} value(s) could not be read as numbers and were treated as empty",
                count
            ),
            ValidationIssue::ScanFailed { cause } => {
                write!(f, "error reading dynamic categories: {}", cause)
            }
        }
    }
}

/// Structured diagnostics for one report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub sheet_found: bool,
    pub has_data: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// One named numeric row aligned with the categories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedSeries {
    pub name: String,
    pub data: Vec<Option<f64>>,
}

impl ParsedSeries {
    pub fn non_null_count(&self) -> usize {
        self.data.iter().filter(|v| v.is_some()).count()
    }
}

/// Chart-ready output of one report extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub report_id: u32,
    pub categories: Vec<String>,
    pub series: Vec<ParsedSeries>,
    /// Consumed header span, e.g. "C3:DR3"
    pub resolved_range: String,
    pub discarded_columns: usize,
    pub validation: ValidationReport,
}

impl ExtractionResult {
    pub fn empty(report_id: u32) -> Self {
        Self {
            report_id,
            categories: Vec::new(),
            series: Vec::new(),
            resolved_range: String::new(),
            discarded_columns: 0,
            validation: ValidationReport::default(),
        }
    }
}
