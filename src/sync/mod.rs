//! Remote workbook sync
//!
//! Resolves sharing links, polls item metadata and downloads a workbook only
//! when its eTag changed. Downloaded buffers go through the same loader as
//! manual uploads.

pub mod client;
pub mod retry;
pub mod share;
pub mod state;
pub mod worker;

pub use client::{DriveItemMeta, GraphClient, RemoteSource, GRAPH_BASE_URL};
pub use retry::RetryPolicy;
pub use share::{sanitize_link, share_id_from_link};
pub use state::{StoredFileMeta, SyncState};
pub use worker::{
    sync_all, sync_file, FileSyncOutcome, FileSyncStatus, SyncContext, SyncOptions, SyncReport,
    SyncStatus, SyncTarget,
};
