use super::*;
use crate::config::default_reports;
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook};
use tempfile::TempDir;

/// Billing workbook with the first report's layout (sheet "Precio Medio", header E23)
fn write_billing_fixture(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("billing.xlsx");
    let mut book = XlsxWorkbook::new();
    let date = Format::new().set_num_format("mmm-yy");
    let sheet = book.add_worksheet();
    sheet.set_name("Precio Medio").unwrap();
    for (i, serial) in [45292.0, 45323.0, 45352.0].iter().enumerate() {
        let col = 4 + i as u16;
        sheet.write_number_with_format(22, col, *serial, &date).unwrap();
        sheet.write_number(24, col, 50.0 + i as f64).unwrap();
    }
    sheet.write_string(24, 2, "Precio medio").unwrap();
    book.save(&path).unwrap();
    path
}

// =========================================================================
// WorkbookInputs Tests
// =========================================================================

#[test]
fn test_inputs_without_files_rejected() {
    let inputs = WorkbookInputs {
        max_file_mb: 30,
        ..WorkbookInputs::default()
    };
    let err = inputs.load().unwrap_err();
    assert!(err.to_string().contains("no workbook given"));
}

#[test]
fn test_inputs_wrong_extension_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes.txt");
    fs::write(&path, "hello").unwrap();
    let inputs = WorkbookInputs {
        billing: Some(path),
        balance: None,
        max_file_mb: 30,
    };
    assert!(matches!(inputs.load(), Err(ChartError::Upload(_))));
}

#[test]
fn test_inputs_paths_in_family_order() {
    let inputs = WorkbookInputs {
        billing: Some(PathBuf::from("a.xlsx")),
        balance: Some(PathBuf::from("b.xlsx")),
        max_file_mb: 30,
    };
    let families: Vec<FileFamily> = inputs.paths().map(|(f, _)| f).collect();
    assert_eq!(families, vec![FileFamily::Billing, FileFamily::Balance]);
}

// =========================================================================
// Command Tests
// =========================================================================

#[test]
fn test_title_of_unknown_report() {
    let reports = default_reports().unwrap();
    assert_eq!(title_of(&reports, 999), "?");
    assert_eq!(title_of(&reports, 1), reports[0].title);
}

#[test]
fn test_reports_builtin() {
    assert!(reports(None).is_ok());
}

#[test]
fn test_export_json_and_csv() {
    let dir = TempDir::new().unwrap();
    let inputs = WorkbookInputs {
        billing: Some(write_billing_fixture(&dir)),
        balance: None,
        max_file_mb: 30,
    };

    let json = dir.path().join("out.json");
    export(&inputs, None, json.clone(), false).unwrap();
    let results: Vec<ExtractionResult> =
        serde_json::from_str(&fs::read_to_string(&json).unwrap()).unwrap();
    let first = results.iter().find(|r| r.report_id == 1).unwrap();
    assert_eq!(first.categories, vec!["ene-24", "feb-24", "mar-24"]);
    assert_eq!(first.series[0].name, "Precio medio");
    assert_eq!(first.series[0].data, vec![Some(50.0), Some(51.0), Some(52.0)]);

    let csv_dir = dir.path().join("csv");
    export(&inputs, None, csv_dir.clone(), true).unwrap();
    assert_eq!(fs::read_dir(&csv_dir).unwrap().count(), 6);
}

#[test]
fn test_validate_reports_errors_for_incomplete_workbook() {
    let dir = TempDir::new().unwrap();
    let inputs = WorkbookInputs {
        billing: Some(write_billing_fixture(&dir)),
        balance: None,
        max_file_mb: 30,
    };
    // Only one of the six billing sheets exists
    assert!(matches!(
        validate(&inputs, None),
        Err(ChartError::Validation(_))
    ));
}

#[test]
fn test_sync_requires_a_link() {
    let dir = TempDir::new().unwrap();
    let command = SyncCommand {
        billing_link: None,
        balance_link: None,
        token: "t".into(),
        state_file: dir.path().join("state.json"),
        out_dir: None,
        check_only: false,
        interval_minutes: None,
        base_url: None,
        max_file_mb: 30,
    };
    assert!(matches!(sync(command, None), Err(ChartError::Sync(_))));
}
