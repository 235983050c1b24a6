//! Chartsheet API Server binary

use clap::Parser;
use royalbit_chartsheet::api::{run_api_server, ApiConfig};
use royalbit_chartsheet::excel::DEFAULT_MAX_FILE_MB;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "chartsheet-server")]
#[command(version)]
#[command(about = "Chartsheet API Server - workbook extraction over HTTP")]
#[command(long_about = r#"
Chartsheet API Server

Endpoints:
  - GET  /api/v1/reports                    - Configured reports
  - POST /api/v1/extract?family=billing     - Extract reports from the
                                              workbook sent as the body
  - GET  /health                            - Health check
  - GET  /version                           - Server version info
  - GET  /                                  - API documentation

Features:
  - CORS enabled for cross-origin requests
  - Graceful shutdown on SIGINT/SIGTERM
  - JSON response format with request IDs
  - Upload size limit (--max-file-mb)

Example usage:
  chartsheet-server --host 0.0.0.0 --port 3000

  curl -X POST 'http://localhost:8080/api/v1/extract?family=billing' \
    --data-binary @facturacion.xlsx
"#)]
struct Args {
    /// Host address to bind to (use 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "CHARTSHEET_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "CHARTSHEET_PORT")]
    port: u16,

    /// Maximum upload size in megabytes
    #[arg(long, env = "CHARTSHEET_MAX_FILE_MB", default_value_t = DEFAULT_MAX_FILE_MB)]
    max_file_mb: u64,

    /// Report configuration (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = ApiConfig {
        host: args.host,
        port: args.port,
        max_file_mb: args.max_file_mb,
        reports: args.config,
    };

    run_api_server(config).await
}
