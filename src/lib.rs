//! Chartsheet - spreadsheet reports to chart-ready series
//!
//! This library loads semi-structured workbooks (fixed sheet names,
//! variable-length month rows) and extracts aligned category/series data
//! for charting, with structured diagnostics per report.
//!
//! # Features
//!
//! - Header scanning that stops at a run of blank cells
//! - Month-label formatting of date cells ("ene-24")
//! - Fixed-length series aligned with the categories
//! - Per-report errors and warnings instead of failures
//! - CSV, Excel and JSON export
//! - Optional sync from shared links with eTag change detection
//!
//! # Example
//!
//! ```no_run
//! use royalbit_chartsheet::config::default_reports;
//! use royalbit_chartsheet::excel::WorkbookLoader;
//! use royalbit_chartsheet::extract::build_all;
//! use royalbit_chartsheet::types::{FileFamily, WorkbookSet};
//! use std::path::Path;
//!
//! let reports = default_reports()?;
//! let workbook = WorkbookLoader::new().load_path(Path::new("facturacion.xlsx"))?;
//!
//! let mut workbooks = WorkbookSet::default();
//! workbooks.set(FileFamily::Billing, workbook);
//!
//! for result in build_all(&workbooks, &reports) {
//!     println!("{}: {} categories", result.report_id, result.categories.len());
//! }
//! # Ok::<(), royalbit_chartsheet::error::ChartError>(())
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod excel;
pub mod extract;
pub mod sync;
pub mod types;
pub mod writer;

// Re-export commonly used types
pub use config::ReportConfig;
pub use error::{ChartError, ChartResult};
pub use extract::{build, build_all};
pub use types::{Cell, CellValue, ExtractionResult, FileFamily, Sheet, Workbook, WorkbookSet};
