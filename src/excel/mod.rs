//! Excel boundary: workbook loading (calamine) and result export (rust_xlsxwriter)

mod exporter;
mod loader;

pub use exporter::ResultExporter;
pub use loader::{
    load_workbook_bytes, WorkbookLoader, ACCEPTED_EXTENSIONS, DEFAULT_MAX_FILE_MB,
};
