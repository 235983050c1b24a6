//! API request handlers

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::server::AppState;
use crate::config::ReportConfig;
use crate::error::ChartError;
use crate::extract::build_all;
use crate::types::{ExtractionResult, FileFamily, WorkbookSet};

/// Standard API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            request_id: Uuid::new_v4().to_string(),
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            request_id: Uuid::new_v4().to_string(),
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Root endpoint response
#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EndpointInfo {
    pub path: String,
    pub method: String,
    pub description: String,
}

fn endpoint(method: &str, path: &str, description: &str) -> EndpointInfo {
    EndpointInfo {
        path: path.to_string(),
        method: method.to_string(),
        description: description.to_string(),
    }
}

/// GET / - Root info
pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(RootResponse {
        name: "Chartsheet API Server".to_string(),
        version: state.version.clone(),
        description: "Spreadsheet reports to chart-ready series".to_string(),
        endpoints: vec![
            endpoint("GET", "/health", "Health check endpoint"),
            endpoint("GET", "/version", "Get server version"),
            endpoint("GET", "/api/v1/reports", "List configured reports"),
            endpoint(
                "POST",
                "/api/v1/extract?family=<billing|balance>",
                "Extract every report of a family from the workbook in the body",
            ),
        ],
    }))
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// GET /health - Health check
pub async fn health() -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse {
        status: "healthy".to_string(),
    }))
}

/// Version response
#[derive(Debug, Serialize, Deserialize)]
pub struct VersionResponse {
    pub version: String,
    pub families: Vec<FileFamily>,
}

/// GET /version - Server version
pub async fn version(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(VersionResponse {
        version: state.version.clone(),
        families: FileFamily::ALL.to_vec(),
    }))
}

/// GET /api/v1/reports - Configured reports
pub async fn reports(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.reports.clone()))
}

#[derive(Debug, Deserialize)]
pub struct ExtractQuery {
    pub family: FileFamily,
}

/// POST /api/v1/extract - Load the uploaded workbook and extract its reports
pub async fn extract(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ExtractQuery>,
    body: Bytes,
) -> impl IntoResponse {
    let family = query.family;
    info!(%family, bytes = body.len(), "extract request");

    let worker_state = Arc::clone(&state);
    let outcome = tokio::task::spawn_blocking(move || {
        let workbook = worker_state.loader.load_bytes(&body)?;
        let mut set = WorkbookSet::default();
        set.set(family, workbook);
        let reports: Vec<ReportConfig> = worker_state
            .reports
            .iter()
            .filter(|r| r.family == family)
            .cloned()
            .collect();
        Ok::<_, ChartError>(build_all(&set, &reports))
    })
    .await;

    match outcome {
        Ok(Ok(results)) => (StatusCode::OK, Json(ApiResponse::ok(results))),
        Ok(Err(e)) => {
            warn!(%family, error = %e, "workbook rejected");
            let status = match e {
                ChartError::Upload(_) => StatusCode::PAYLOAD_TOO_LARGE,
                _ => StatusCode::UNPROCESSABLE_ENTITY,
            };
            (status, Json(ApiResponse::<Vec<ExtractionResult>>::err(e.to_string())))
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::err(format!("extraction task failed: {}", e))),
        ),
    }
}
