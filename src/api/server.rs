//! Chartsheet API server
//!
//! HTTP API over the extraction engine: upload a workbook, get chart-ready
//! series and diagnostics back.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::handlers;
use crate::config::{load_reports_or_default, ReportConfig};
use crate::error::ChartResult;
use crate::excel::{WorkbookLoader, DEFAULT_MAX_FILE_MB};

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub max_file_mb: u64,
    /// Report configuration file; built-in reports when absent
    pub reports: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_file_mb: DEFAULT_MAX_FILE_MB,
            reports: None,
        }
    }
}

/// Shared application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub version: String,
    pub reports: Vec<ReportConfig>,
    pub loader: WorkbookLoader,
}

impl AppState {
    pub fn new(reports: Vec<ReportConfig>, max_file_mb: u64) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            reports,
            loader: WorkbookLoader::with_max_mb(max_file_mb),
        }
    }

    pub fn from_config(config: &ApiConfig) -> ChartResult<Self> {
        let reports = load_reports_or_default(config.reports.as_deref())?;
        Ok(Self::new(reports, config.max_file_mb))
    }
}

/// Build the router; the upload body limit follows the loader's size limit
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = usize::try_from(state.loader.max_bytes()).unwrap_or(usize::MAX);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/version", get(handlers::version))
        .route("/api/v1/reports", get(handlers::reports))
        .route(
            "/api/v1/extract",
            post(handlers::extract).layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Run the API server
pub async fn run_api_server(config: ApiConfig) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chartsheet_server=info,royalbit_chartsheet=info,tower_http=info".into()),
        )
        .init();

    let state = Arc::new(AppState::from_config(&config)?);
    info!(reports = state.reports.len(), "report configuration loaded");
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("📊 Chartsheet API Server starting on http://{}", addr);
    info!("   Endpoints: /api/v1/reports, /api/v1/extract?family=<billing|balance>");
    info!("   Health: /health, Version: /version");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Chartsheet API Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, stopping server...");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_file_mb, 30);
        assert!(config.reports.is_none());
    }

    #[test]
    fn test_state_from_default_config() {
        let state = AppState::from_config(&ApiConfig::default()).unwrap();
        assert_eq!(state.reports.len(), 7);
        assert_eq!(state.loader.max_bytes(), 30 * 1024 * 1024);
    }

    #[test]
    fn test_state_from_missing_config_file() {
        let config = ApiConfig {
            reports: Some(PathBuf::from("/nonexistent/reports.yaml")),
            ..ApiConfig::default()
        };
        assert!(AppState::from_config(&config).is_err());
    }
}
