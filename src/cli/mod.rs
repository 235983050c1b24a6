//! CLI command handlers

pub mod commands;

pub use commands::{
    export, extract, load_saved_downloads, reports, sync, sync_pass, validate, watch,
    SyncCommand, WorkbookInputs,
};
