use crate::config::{load_reports_or_default, ReportConfig};
use crate::error::{ChartError, ChartResult};
use crate::excel::{ResultExporter, WorkbookLoader};
use crate::extract::build_all;
use crate::sync::{
    sync_all, GraphClient, SyncContext, SyncOptions, SyncReport, SyncState, SyncStatus,
    SyncTarget,
};
use crate::types::{ExtractionResult, FileFamily, WorkbookSet};
use crate::writer::{csv_file_name, write_csv, write_json};
use colored::Colorize;
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;
use tracing::{debug, warn};

/// Categories shown before the list is elided in text output
const PREVIEW_CATEGORIES: usize = 6;

/// Workbook files given on the command line, one per family
#[derive(Debug, Clone, Default)]
pub struct WorkbookInputs {
    pub billing: Option<PathBuf>,
    pub balance: Option<PathBuf>,
    pub max_file_mb: u64,
}

impl WorkbookInputs {
    pub fn paths(&self) -> impl Iterator<Item = (FileFamily, &Path)> {
        FileFamily::ALL.into_iter().filter_map(move |family| {
            let path = match family {
                FileFamily::Billing => self.billing.as_deref(),
                FileFamily::Balance => self.balance.as_deref(),
            };
            path.map(|p| (family, p))
        })
    }

    /// Load every given workbook through the upload checks
    pub fn load(&self) -> ChartResult<WorkbookSet> {
        let loader = WorkbookLoader::with_max_mb(self.max_file_mb);
        let mut set = WorkbookSet::default();
        for (family, path) in self.paths() {
            set.set(family, loader.load_path(path)?);
        }
        if !FileFamily::ALL.iter().any(|f| set.is_loaded(*f)) {
            return Err(ChartError::Upload(
                "no workbook given (use --billing and/or --balance)".to_string(),
            ));
        }
        Ok(set)
    }
}

/// Settings of the `sync` command
#[derive(Debug, Clone)]
pub struct SyncCommand {
    pub billing_link: Option<String>,
    pub balance_link: Option<String>,
    pub token: String,
    pub state_file: PathBuf,
    pub out_dir: Option<PathBuf>,
    pub check_only: bool,
    pub interval_minutes: Option<u64>,
    pub base_url: Option<String>,
    pub max_file_mb: u64,
}

fn title_of(reports: &[ReportConfig], id: u32) -> &str {
    reports
        .iter()
        .find(|r| r.id == id)
        .map(|r| r.title.as_str())
        .unwrap_or("?")
}

/// Execute the reports command
pub fn reports(config: Option<PathBuf>) -> ChartResult<()> {
    let reports = load_reports_or_default(config.as_deref())?;

    println!("{}", "📋 Configured reports".bold().green());
    match &config {
        Some(path) => println!("   Config: {}\n", path.display()),
        None => println!("   Config: built-in\n"),
    }

    for report in &reports {
        println!(
            "   [{}] {}",
            report.id.to_string().bold(),
            report.title.bright_blue().bold()
        );
        println!(
            "       {} · sheet '{}' · header {}{}",
            report.family,
            report.sheet,
            report.category_start_cell,
            report
                .category_start_cell_row2
                .map(|a| format!(" + {}", a))
                .unwrap_or_default()
        );
        println!("       {} series", report.series.len());
    }
    println!("\n   {} reports", reports.len());
    Ok(())
}

fn print_issues(result: &ExtractionResult) {
    for error in &result.validation.errors {
        println!("      {} {}", "❌".red(), error.to_string().red());
    }
    for warning in &result.validation.warnings {
        println!("      {} {}", "⚠️ ".yellow(), warning.to_string().yellow());
    }
}

fn print_result(result: &ExtractionResult, reports: &[ReportConfig], verbose: bool) {
    println!(
        "\n📊 [{}] {}",
        result.report_id,
        title_of(reports, result.report_id).bright_blue().bold()
    );
    if !result.resolved_range.is_empty() {
        println!("   Range: {}", result.resolved_range);
    }

    let shown: Vec<&str> = result
        .categories
        .iter()
        .take(PREVIEW_CATEGORIES)
        .map(String::as_str)
        .collect();
    let more = result.categories.len().saturating_sub(shown.len());
    println!(
        "   Categories ({}): {}{}",
        result.categories.len(),
        shown.join(", "),
        if more > 0 {
            format!(", … (+{})", more)
        } else {
            String::new()
        }
    );
    if result.discarded_columns > 0 {
        println!("   Discarded columns: {}", result.discarded_columns);
    }

    for series in &result.series {
        println!(
            "   • {}: {}/{} values",
            series.name,
            series.non_null_count(),
            series.data.len()
        );
        if verbose {
            let values: Vec<String> = series
                .data
                .iter()
                .map(|v| v.map(crate::types::format_number).unwrap_or_else(|| "-".into()))
                .collect();
            println!("     {}", values.join(" ").dimmed());
        }
    }
    print_issues(result);
}

/// Execute the extract command
pub fn extract(
    inputs: &WorkbookInputs,
    config: Option<PathBuf>,
    json: bool,
    verbose: bool,
) -> ChartResult<()> {
    let reports = load_reports_or_default(config.as_deref())?;
    let workbooks = inputs.load()?;
    let results = build_all(&workbooks, &reports);

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    println!("{}", "🔥 Chartsheet - Extraction".bold().green());
    for (family, path) in inputs.paths() {
        println!("   {}: {}", family, path.display());
    }
    for result in &results {
        print_result(result, &reports, verbose);
    }
    println!();
    Ok(())
}

/// Print the validator panel; returns the number of reports with errors
fn print_validation(results: &[ExtractionResult], reports: &[ReportConfig]) -> usize {
    let mut failed = 0;
    for result in results {
        let title = title_of(reports, result.report_id);
        if result.validation.is_ok() {
            println!(
                "   {} [{}] {} ({} categories, {} series)",
                "✅".green(),
                result.report_id,
                title,
                result.categories.len(),
                result.series.len()
            );
        } else {
            failed += 1;
            println!(
                "   {} [{}] {}",
                "❌".red(),
                result.report_id,
                title.bold().red()
            );
        }
        print_issues(result);
    }
    failed
}

/// Execute the validate command
pub fn validate(inputs: &WorkbookInputs, config: Option<PathBuf>) -> ChartResult<()> {
    println!("{}", "✅ Validating workbooks".bold().green());
    for (family, path) in inputs.paths() {
        println!("   {}: {}", family, path.display());
    }
    println!();

    let reports = load_reports_or_default(config.as_deref())?;
    let workbooks = inputs.load()?;
    let results = build_all(&workbooks, &reports);

    if results.is_empty() {
        println!("{}", "⚠️  No configured report matches the given workbooks".yellow());
        return Ok(());
    }

    let failed = print_validation(&results, &reports);
    println!();
    if failed == 0 {
        println!("{}", "✅ All reports are valid!".bold().green());
        Ok(())
    } else {
        println!(
            "{}",
            format!("❌ {} of {} reports have errors", failed, results.len())
                .bold()
                .red()
        );
        Err(ChartError::Validation(format!(
            "{} report(s) failed validation",
            failed
        )))
    }
}

/// Execute the export command.
///
/// `.xlsx` and `.json` outputs hold every result; any other path is a
/// directory receiving one CSV per report.
pub fn export(
    inputs: &WorkbookInputs,
    config: Option<PathBuf>,
    output: PathBuf,
    verbose: bool,
) -> ChartResult<()> {
    println!("{}", "🔥 Chartsheet - Export".bold().green());
    println!("   Output: {}\n", output.display());

    let reports = load_reports_or_default(config.as_deref())?;
    let workbooks = inputs.load()?;
    let results = build_all(&workbooks, &reports);

    if verbose {
        println!("   {} results extracted", results.len());
    }

    let extension = output
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match extension.as_deref() {
        Some("xlsx") => {
            ResultExporter::new(&results, &reports).export(&output)?;
            println!("{}", "✅ Excel export complete!".bold().green());
        }
        Some("json") => {
            write_json(&output, &results)?;
            println!("{}", "✅ JSON export complete!".bold().green());
        }
        _ => {
            fs::create_dir_all(&output)?;
            for result in &results {
                let name = csv_file_name(title_of(&reports, result.report_id))?;
                let path = output.join(name);
                write_csv(&path, result)?;
                if verbose {
                    println!("   📄 {}", path.display());
                }
            }
            println!(
                "{}",
                format!("✅ {} CSV files written", results.len())
                    .bold()
                    .green()
            );
        }
    }
    Ok(())
}

/// Execute the watch command
pub fn watch(inputs: &WorkbookInputs, config: Option<PathBuf>) -> ChartResult<()> {
    println!("{}", "👁️  Chartsheet - Watch Mode".bold().green());

    let mut watched = Vec::new();
    for (family, path) in inputs.paths() {
        let canonical = path.canonicalize().map_err(|_| {
            ChartError::Validation(format!("File not found: {}", path.display()))
        })?;
        println!("   Watching {}: {}", family, canonical.display());
        watched.push(canonical);
    }
    if watched.is_empty() {
        return Err(ChartError::Upload(
            "no workbook given (use --billing and/or --balance)".to_string(),
        ));
    }
    println!("   Press {} to stop\n", "Ctrl+C".bold().yellow());

    let (tx, rx) = channel();
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)
        .map_err(|e| ChartError::Validation(format!("Failed to create file watcher: {}", e)))?;

    let mut dirs: Vec<&Path> = watched.iter().filter_map(|p| p.parent()).collect();
    dirs.sort();
    dirs.dedup();
    for dir in dirs {
        debouncer
            .watcher()
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| ChartError::Validation(format!("Failed to watch directory: {}", e)))?;
    }

    println!("{}", "🔄 Initial run...".cyan());
    run_watch_action(inputs, config.as_deref());
    println!();

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let relevant = events.iter().any(|event| {
                    event.kind == DebouncedEventKind::Any
                        && event
                            .path
                            .canonicalize()
                            .map(|p| watched.contains(&p))
                            .unwrap_or(false)
                });
                if relevant {
                    println!(
                        "\n{} {}",
                        "🔄 Change detected at".cyan(),
                        chrono::Local::now().format("%H:%M:%S").to_string().cyan()
                    );
                    run_watch_action(inputs, config.as_deref());
                    println!();
                }
            }
            Ok(Err(error)) => {
                eprintln!("{} Watch error: {}", "❌".red(), error);
            }
            Err(e) => {
                eprintln!("{} Channel error: {}", "❌".red(), e);
                break;
            }
        }
    }

    Ok(())
}

/// Reload and revalidate; failures are printed, never fatal
fn run_watch_action(inputs: &WorkbookInputs, config: Option<&Path>) {
    let outcome = load_reports_or_default(config).and_then(|reports| {
        let workbooks = inputs.load()?;
        let results = build_all(&workbooks, &reports);
        Ok(print_validation(&results, &reports))
    });
    match outcome {
        Ok(0) => println!("{}", "✅ Validation passed".bold().green()),
        Ok(failed) => println!(
            "{}",
            format!("❌ {} report(s) with errors", failed).bold().red()
        ),
        Err(e) => println!("{} {}", "❌ Load failed:".bold().red(), e),
    }
}

fn status_icon(status: SyncStatus) -> colored::ColoredString {
    match status {
        SyncStatus::Success => "✅".green(),
        SyncStatus::UpToDate => "✔".green(),
        SyncStatus::UpdateAvailable => "⬇".cyan(),
        SyncStatus::Error => "❌".red(),
        SyncStatus::NeedsConsent => "🔒".yellow(),
        SyncStatus::Idle => "·".normal(),
    }
}

fn print_sync_report(report: &SyncReport) {
    for (family, status) in &report.statuses {
        println!(
            "   {} {}: {}{}",
            status_icon(status.status),
            family,
            status.status.as_str(),
            status
                .message
                .as_deref()
                .map(|m| format!(" ({})", m))
                .unwrap_or_default()
        );
        if let Some(modified) = &status.last_modified {
            println!("      last modified {}", modified.dimmed());
        }
    }
}

fn save_downloads(report: &SyncReport, out_dir: &Path) -> ChartResult<()> {
    fs::create_dir_all(out_dir)?;
    for (family, bytes) in &report.downloads {
        let path = out_dir.join(format!("{}.xlsx", family));
        fs::write(&path, bytes)?;
        println!("   💾 {}", path.display());
    }
    Ok(())
}

/// Workbooks written by earlier syncs, keyed by family.
///
/// Files that are missing or fail to load are skipped, so that family is
/// downloaded again.
pub fn load_saved_downloads(out_dir: &Path, loader: &WorkbookLoader) -> WorkbookSet {
    let mut set = WorkbookSet::default();
    for family in FileFamily::ALL {
        let path = out_dir.join(format!("{}.xlsx", family));
        if !path.is_file() {
            continue;
        }
        match loader.load_path(&path) {
            Ok(workbook) => {
                debug!(%family, path = %path.display(), "reusing saved download");
                set.set(family, workbook);
            }
            Err(e) => warn!(%family, path = %path.display(), error = %e, "ignoring saved download"),
        }
    }
    set
}

/// One sync round: load state, sync every target, persist state and downloads
pub async fn sync_pass(
    ctx: SyncContext<'_>,
    targets: &[SyncTarget],
    state_file: &Path,
    out_dir: Option<&Path>,
    workbooks: &WorkbookSet,
) -> ChartResult<SyncReport> {
    let mut state = SyncState::load(state_file);
    let report = sync_all(ctx, targets, &mut state, workbooks).await;
    state
        .save(state_file)
        .map_err(|e| ChartError::Sync(e.to_string()))?;
    if let (true, Some(dir)) = (report.changed, out_dir) {
        save_downloads(&report, dir)?;
    }
    Ok(report)
}

/// Execute the sync command
pub fn sync(command: SyncCommand, config: Option<PathBuf>) -> ChartResult<()> {
    println!("{}", "☁️  Chartsheet - Remote Sync".bold().green());

    let reports = load_reports_or_default(config.as_deref())?;
    let targets: Vec<SyncTarget> = [
        (FileFamily::Billing, &command.billing_link),
        (FileFamily::Balance, &command.balance_link),
    ]
    .into_iter()
    .filter_map(|(family, link)| link.as_ref().map(|l| SyncTarget::new(family, l.clone())))
    .collect();
    if targets.is_empty() {
        return Err(ChartError::Sync(
            "no share link given (use --billing-link and/or --balance-link)".to_string(),
        ));
    }

    let client = match &command.base_url {
        Some(url) => GraphClient::with_base_url(url.clone()),
        None => GraphClient::new(),
    }
    .map_err(|e| ChartError::Sync(e.to_string()))?;
    let loader = WorkbookLoader::with_max_mb(command.max_file_mb);
    let runtime = tokio::runtime::Runtime::new()?;

    let ctx = SyncContext {
        source: &client,
        loader: &loader,
        token: &command.token,
        options: SyncOptions {
            only_check_meta: command.check_only,
        },
    };

    let mut workbooks = command
        .out_dir
        .as_deref()
        .map(|dir| load_saved_downloads(dir, &loader))
        .unwrap_or_default();
    loop {
        let report = runtime.block_on(sync_pass(
            ctx,
            &targets,
            &command.state_file,
            command.out_dir.as_deref(),
            &workbooks,
        ))?;

        println!(
            "\n{} {}",
            "🔄 Sync at".cyan(),
            chrono::Local::now().format("%H:%M:%S").to_string().cyan()
        );
        print_sync_report(&report);

        if report.changed {
            let results = build_all(&report.workbooks, &reports);
            print_validation(&results, &reports);
        }
        workbooks = report.workbooks.clone();

        let Some(minutes) = command.interval_minutes else {
            if report.needs_consent() {
                return Err(ChartError::Sync(
                    "insufficient permissions for the shared files".to_string(),
                ));
            }
            if report.has_failures() {
                return Err(ChartError::Sync("one or more files failed to sync".to_string()));
            }
            return Ok(());
        };
        std::thread::sleep(Duration::from_secs(minutes.max(1) * 60));
    }
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
