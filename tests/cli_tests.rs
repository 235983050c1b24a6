//! CLI integration tests
//!
//! Runs the `chartsheet` binary with assert_cmd against generated workbooks.

#![allow(deprecated)] // Command::cargo_bin deprecation - no stable replacement yet

use assert_cmd::Command;
use predicates::prelude::*;
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn chartsheet() -> Command {
    let mut cmd = Command::cargo_bin("chartsheet").unwrap();
    cmd.env_remove("CHARTSHEET_TOKEN")
        .env_remove("CHARTSHEET_BILLING_LINK")
        .env_remove("CHARTSHEET_BALANCE_LINK")
        .env_remove("CHARTSHEET_MAX_FILE_MB")
        .env("NO_COLOR", "1");
    cmd
}

/// Balance workbook that satisfies the built-in "Perfil" report
fn balance_fixture(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("balance.xlsx");
    let mut book = XlsxWorkbook::new();
    let month = Format::new().set_num_format("mmm-yy");
    let sheet = book.add_worksheet();
    sheet.set_name("Perfil").unwrap();
    for (i, serial) in [45292.0, 45323.0, 45352.0].iter().enumerate() {
        sheet
            .write_number_with_format(2, 2 + i as u16, *serial, &month)
            .unwrap();
    }
    for (row, name) in [(15, "Hidráulica"), (16, "Térmica"), (18, "Eólica"), (19, "Solar")] {
        sheet.write_string(row, 1, name).unwrap();
        for col in 0..3u16 {
            sheet.write_number(row, 2 + col, 100.0 + col as f64).unwrap();
        }
    }
    book.save(&path).unwrap();
    path
}

/// Billing workbook with none of the configured sheets
fn empty_billing_fixture(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("billing.xlsx");
    let mut book = XlsxWorkbook::new();
    book.add_worksheet().set_name("Hoja1").unwrap();
    book.save(&path).unwrap();
    path
}

// ═══════════════════════════════════════════════════════════════════════════
// HELP AND VERSION
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_cli_help() {
    chartsheet()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("chartsheet"))
        .stdout(predicate::str::contains("COMMANDS"));
}

#[test]
fn test_cli_version() {
    chartsheet()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("chartsheet"));
}

#[test]
fn test_subcommand_help() {
    for sub in ["reports", "extract", "validate", "export", "watch", "sync"] {
        chartsheet().args([sub, "--help"]).assert().success();
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// REPORTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_reports_lists_builtin_set() {
    chartsheet()
        .arg("reports")
        .assert()
        .success()
        .stdout(predicate::str::contains("Precio Medio"))
        .stdout(predicate::str::contains("7 reports"));
}

#[test]
fn test_reports_with_invalid_config_fails() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("bad.yaml");
    fs::write(&config, "reports:\n  - id: 1\n").unwrap();
    chartsheet()
        .args(["reports", "--config"])
        .arg(&config)
        .assert()
        .failure();
}

#[test]
fn test_reports_with_custom_config() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("reports.yaml");
    fs::write(
        &config,
        r#"
reports:
  - id: 42
    title: "Custom"
    family: balance
    sheet: Perfil
    category_start_cell: C3
    series:
      - { name_cell: B16, values_start_cell: C16 }
"#,
    )
    .unwrap();
    chartsheet()
        .args(["reports", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Custom"))
        .stdout(predicate::str::contains("1 reports"));
}

// ═══════════════════════════════════════════════════════════════════════════
// EXTRACT AND VALIDATE
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_extract_json() {
    let dir = TempDir::new().unwrap();
    let balance = balance_fixture(&dir);
    let output = chartsheet()
        .args(["extract", "--json", "--balance"])
        .arg(&balance)
        .output()
        .unwrap();
    assert!(output.status.success());

    let results: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(results[0]["report_id"], 7);
    assert_eq!(
        results[0]["categories"],
        serde_json::json!(["ene-24", "feb-24", "mar-24"])
    );
    assert_eq!(results[0]["series"][0]["name"], "Solar");
}

#[test]
fn test_extract_text() {
    let dir = TempDir::new().unwrap();
    chartsheet()
        .args(["extract", "--balance"])
        .arg(balance_fixture(&dir))
        .assert()
        .success()
        .stdout(predicate::str::contains("Categories (3): ene-24, feb-24, mar-24"))
        .stdout(predicate::str::contains("Solar: 3/3 values"));
}

#[test]
fn test_extract_without_workbooks_fails() {
    chartsheet().arg("extract").assert().failure();
}

#[test]
fn test_validate_passes() {
    let dir = TempDir::new().unwrap();
    chartsheet()
        .args(["validate", "--balance"])
        .arg(balance_fixture(&dir))
        .assert()
        .success()
        .stdout(predicate::str::contains("All reports are valid"));
}

#[test]
fn test_validate_missing_sheets_fails() {
    let dir = TempDir::new().unwrap();
    chartsheet()
        .args(["validate", "--billing"])
        .arg(empty_billing_fixture(&dir))
        .assert()
        .failure()
        .stdout(predicate::str::contains("sheet \"Precio Medio\" does not exist"))
        .stdout(predicate::str::contains("6 of 6 reports have errors"));
}

#[test]
fn test_upload_size_limit_from_env() {
    let dir = TempDir::new().unwrap();
    chartsheet()
        .env("CHARTSHEET_MAX_FILE_MB", "0")
        .args(["validate", "--balance"])
        .arg(balance_fixture(&dir))
        .assert()
        .failure();
}

// ═══════════════════════════════════════════════════════════════════════════
// EXPORT
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_export_csv_directory() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("csv");
    chartsheet()
        .args(["export", "--balance"])
        .arg(balance_fixture(&dir))
        .arg(&out)
        .assert()
        .success();

    let csv = fs::read_to_string(out.join("Producción_de_energía_activa_2016-2025.csv")).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some(r#"Category,"Solar","Eólica","Hidráulica","Térmica""#)
    );
    assert_eq!(lines.next(), Some(r#""ene-24",100,100,100,100"#));
}

#[test]
fn test_export_xlsx() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("results.xlsx");
    chartsheet()
        .args(["export", "--balance"])
        .arg(balance_fixture(&dir))
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Excel export complete"));
    assert!(out.exists());
}

// ═══════════════════════════════════════════════════════════════════════════
// SYNC
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_sync_requires_token() {
    chartsheet()
        .args(["sync", "--billing-link", "https://example.com/x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--token"));
}

#[test]
fn test_sync_requires_link() {
    chartsheet()
        .args(["sync", "--token", "t"])
        .assert()
        .failure();
}
