//! Chartsheet API server module
//!
//! HTTP API over the extraction engine. Run with `chartsheet-server`.

pub mod handlers;
pub mod server;

pub use server::{router, run_api_server, ApiConfig, AppState};
