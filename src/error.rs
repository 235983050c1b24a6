use crate::extract::address::AddressError;
use thiserror::Error;

pub type ChartResult<T> = Result<T, ChartError>;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Address error: {0}")]
    Address(#[from] AddressError),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Upload rejected: {0}")]
    Upload(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Sync error: {0}")]
    Sync(String),
}

pub type SyncResult<T> = Result<T, SyncError>;

/// Failures at the remote-sync boundary
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Access denied (HTTP {status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Workbook error: {0}")]
    Workbook(#[from] ChartError),
}

impl SyncError {
    /// Whether the failure calls for broader consent rather than a retry
    pub fn is_auth(&self) -> bool {
        matches!(self, SyncError::Unauthorized { .. })
    }
}
