use clap::{Args, Parser, Subcommand};
use royalbit_chartsheet::cli::{self, SyncCommand, WorkbookInputs};
use royalbit_chartsheet::error::ChartResult;
use royalbit_chartsheet::excel::DEFAULT_MAX_FILE_MB;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chartsheet")]
#[command(about = "Turn semi-structured spreadsheet workbooks into chart-ready series.")]
#[command(long_about = "Chartsheet - spreadsheet reports to chart-ready series

Reads the billing and balance workbooks, finds the month header of every
configured report, and extracts aligned numeric series with diagnostics.

COMMANDS:
  reports   - List configured reports
  extract   - Extract every report (text or JSON)
  validate  - Validator panel: errors and warnings per report
  export    - Write results as CSV, Excel (.xlsx) or JSON
  watch     - Re-validate when a workbook changes
  sync      - Download workbooks from a shared link when they changed

EXAMPLES:
  chartsheet extract --billing facturacion.xlsx
  chartsheet validate --billing facturacion.xlsx --balance balance.xlsx
  chartsheet export --billing facturacion.xlsx out/
  chartsheet sync --billing-link https://... --token $TOKEN --out-dir data/")]
#[command(version)]
struct Cli {
    /// Report configuration (YAML); defaults to the built-in report set
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Billing workbook (.xlsx, .xls, .ods)
    #[arg(long)]
    billing: Option<PathBuf>,

    /// Balance workbook (.xlsx, .xls, .ods)
    #[arg(long)]
    balance: Option<PathBuf>,

    /// Maximum workbook size in megabytes
    #[arg(long, env = "CHARTSHEET_MAX_FILE_MB", default_value_t = DEFAULT_MAX_FILE_MB)]
    max_file_mb: u64,
}

impl From<InputArgs> for WorkbookInputs {
    fn from(args: InputArgs) -> Self {
        Self {
            billing: args.billing,
            balance: args.balance,
            max_file_mb: args.max_file_mb,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List configured reports
    Reports,

    /// Extract every report whose workbook is given
    Extract {
        #[command(flatten)]
        inputs: InputArgs,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    #[command(long_about = "Validate workbooks against the report configuration.

Prints one line per report with its errors (missing sheet, empty header
range, no numeric data) and warnings (values that look un-recalculated,
text that could not be read as numbers).

Exits non-zero when any report has errors.")]
    /// Check every report for errors and warnings
    Validate {
        #[command(flatten)]
        inputs: InputArgs,
    },

    #[command(long_about = "Export extraction results.

OUTPUT:
  *.xlsx    one worksheet per report
  *.json    every result with its diagnostics
  <dir>     one CSV per report, named after its title")]
    /// Export results as CSV, Excel or JSON
    Export {
        #[command(flatten)]
        inputs: InputArgs,

        /// Output file (.xlsx/.json) or directory (CSV)
        output: PathBuf,
    },

    /// Re-validate whenever a workbook is saved
    Watch {
        #[command(flatten)]
        inputs: InputArgs,
    },

    #[command(long_about = "Sync workbooks from shared links.

Polls the metadata of each shared file and downloads it only when its
eTag changed since the last sync. State is kept in --state.

A 401/403 answer marks every file as needing consent; other failures
only affect their own file.")]
    /// Download changed workbooks from shared links
    Sync {
        /// Sharing link of the billing workbook
        #[arg(long, env = "CHARTSHEET_BILLING_LINK")]
        billing_link: Option<String>,

        /// Sharing link of the balance workbook
        #[arg(long, env = "CHARTSHEET_BALANCE_LINK")]
        balance_link: Option<String>,

        /// Bearer token for the file share
        #[arg(long, env = "CHARTSHEET_TOKEN", hide_env_values = true)]
        token: String,

        /// Sync state file
        #[arg(long, default_value = ".chartsheet/sync-state.json")]
        state: PathBuf,

        /// Save downloaded workbooks here
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Only report whether updates exist
        #[arg(long)]
        check_only: bool,

        /// Keep syncing every N minutes
        #[arg(long)]
        interval: Option<u64>,

        /// Graph API base URL
        #[arg(long, env = "CHARTSHEET_GRAPH_URL")]
        base_url: Option<String>,

        #[arg(long, env = "CHARTSHEET_MAX_FILE_MB", default_value_t = DEFAULT_MAX_FILE_MB)]
        max_file_mb: u64,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .init();
}

fn main() -> ChartResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = cli.config;

    match cli.command {
        Commands::Reports => cli::reports(config),

        Commands::Extract { inputs, json } => {
            cli::extract(&inputs.into(), config, json, cli.verbose)
        }

        Commands::Validate { inputs } => cli::validate(&inputs.into(), config),

        Commands::Export { inputs, output } => {
            cli::export(&inputs.into(), config, output, cli.verbose)
        }

        Commands::Watch { inputs } => cli::watch(&inputs.into(), config),

        Commands::Sync {
            billing_link,
            balance_link,
            token,
            state,
            out_dir,
            check_only,
            interval,
            base_url,
            max_file_mb,
        } => cli::sync(
            SyncCommand {
                billing_link,
                balance_link,
                token,
                state_file: state,
                out_dir,
                check_only,
                interval_minutes: interval,
                base_url,
                max_file_mb,
            },
            config,
        ),
    }
}
