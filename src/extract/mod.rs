//! Spreadsheet-to-series extraction engine
//!
//! Leaves first: address algebra and cell lookups, numeric normalization,
//! the header scanner and its filter, the fixed-length series reader, and
//! finally the report builder that ties them together.

pub mod address;
pub mod builder;
pub mod cells;
pub mod dates;
pub mod filter;
pub mod normalize;
pub mod scanner;
pub mod series;

pub use address::{AddressError, CellAddress, CellRange};
pub use builder::{build, build_all, ScanError};
pub use filter::filter_categories;
pub use normalize::normalize;
pub use scanner::{scan, RowScan, ScanMode, ScanValue};
pub use series::read_fixed;
