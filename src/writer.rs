//! Text exports of extraction results (CSV and JSON)

use crate::error::{ChartError, ChartResult};
use crate::types::{format_number, ExtractionResult};
use std::fs;
use std::path::Path;

/// Quote a CSV field, doubling embedded quotes
fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Render `{categories, series}` as CSV.
///
/// Header row names each series; every following row holds one category and
/// the aligned values, empty where the value is null.
pub fn to_csv(result: &ExtractionResult) -> String {
    let mut out = String::from("Category");
    for series in &result.series {
        out.push(',');
        out.push_str(&quote(&series.name));
    }
    out.push('\n');

    for (idx, category) in result.categories.iter().enumerate() {
        out.push_str(&quote(category));
        for series in &result.series {
            out.push(',');
            if let Some(Some(v)) = series.data.get(idx) {
                out.push_str(&format_number(*v));
            }
        }
        out.push('\n');
    }
    out
}

/// Write one result as CSV
pub fn write_csv(path: &Path, result: &ExtractionResult) -> ChartResult<()> {
    fs::write(path, to_csv(result))?;
    Ok(())
}

/// Write results as pretty JSON
pub fn write_json(path: &Path, results: &[ExtractionResult]) -> ChartResult<()> {
    let json = serde_json::to_string_pretty(results)?;
    fs::write(path, json)?;
    Ok(())
}

/// File name derived from a report title ("VENTA DE ENERGÍA (GWh)" → "VENTA_DE_ENERGÍA_(GWh).csv")
pub fn csv_file_name(title: &str) -> ChartResult<String> {
    let stem: String = title.split_whitespace().collect::<Vec<_>>().join("_");
    let stem: String = stem
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .collect();
    if stem.is_empty() {
        return Err(ChartError::Export(format!(
            "cannot derive a file name from title '{}'",
            title
        )));
    }
    Ok(format!("{}.csv", stem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ParsedSeries, ValidationReport};
    use pretty_assertions::assert_eq;

    fn sample() -> ExtractionResult {
        ExtractionResult {
            report_id: 5,
            categories: vec!["ene-24".into(), "feb-24".into()],
            series: vec![
                ParsedSeries {
                    name: "Hidráulica".into(),
                    data: vec![Some(10.5), None],
                },
                ParsedSeries {
                    name: "Térmica \"B\"".into(),
                    data: vec![Some(3.0), Some(4.25)],
                },
            ],
            resolved_range: "C5:D5".into(),
            discarded_columns: 0,
            validation: ValidationReport::default(),
        }
    }

    #[test]
    fn test_to_csv() {
        let csv = to_csv(&sample());
        assert_eq!(
            csv,
            "Category,\"Hidráulica\",\"Térmica \"\"B\"\"\"\n\"ene-24\",10.5,3\n\"feb-24\",,4.25\n"
        );
    }

    #[test]
    fn test_to_csv_no_categories() {
        let mut result = sample();
        result.categories.clear();
        let csv = to_csv(&result);
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn test_csv_file_name() {
        assert_eq!(
            csv_file_name("VENTA DE ENERGÍA (GWh)").unwrap(),
            "VENTA_DE_ENERGÍA_(GWh).csv"
        );
        assert_eq!(csv_file_name("A/B  C").unwrap(), "AB_C.csv");
        assert!(csv_file_name("   ").is_err());
    }

    #[test]
    fn test_write_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out.json");
        write_json(&path, &[sample()]).unwrap();
        let back: Vec<ExtractionResult> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, vec![sample()]);
    }
}
