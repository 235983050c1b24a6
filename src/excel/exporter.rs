//! Excel exporter - extraction results → .xlsx, one worksheet per report

use crate::config::ReportConfig;
use crate::error::{ChartError, ChartResult};
use crate::types::ExtractionResult;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::collections::HashSet;
use std::path::Path;

/// Excel's sheet-name length limit
const MAX_SHEET_NAME: usize = 31;

/// Writes chart-ready series back out as a workbook
pub struct ResultExporter<'a> {
    results: &'a [ExtractionResult],
    reports: &'a [ReportConfig],
}

impl<'a> ResultExporter<'a> {
    pub fn new(results: &'a [ExtractionResult], reports: &'a [ReportConfig]) -> Self {
        Self { results, reports }
    }

    /// Export every result to an .xlsx file
    pub fn export(&self, output_path: &Path) -> ChartResult<()> {
        let mut workbook = self.build_workbook()?;
        workbook
            .save(output_path)
            .map_err(|e| ChartError::Export(format!("Failed to save Excel file: {}", e)))?;
        Ok(())
    }

    /// Export to an in-memory buffer
    pub fn to_buffer(&self) -> ChartResult<Vec<u8>> {
        let mut workbook = self.build_workbook()?;
        workbook
            .save_to_buffer()
            .map_err(|e| ChartError::Export(format!("Failed to write Excel buffer: {}", e)))
    }

    fn build_workbook(&self) -> ChartResult<Workbook> {
        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();
        let mut used_names = HashSet::new();

        for result in self.results {
            let title = self
                .reports
                .iter()
                .find(|r| r.id == result.report_id)
                .map(|r| r.title.as_str())
                .unwrap_or("Report");
            let name = unique_sheet_name(result.report_id, title, &mut used_names);

            let worksheet = workbook.add_worksheet();
            worksheet
                .set_name(&name)
                .map_err(|e| ChartError::Export(format!("Failed to set worksheet name: {}", e)))?;
            Self::write_result(worksheet, result, &header)?;
        }

        // rust_xlsxwriter refuses to save a workbook without sheets
        if self.results.is_empty() {
            workbook.add_worksheet();
        }

        Ok(workbook)
    }

    /// Row 0: "Category" + labels; one row per series below
    fn write_result(
        worksheet: &mut Worksheet,
        result: &ExtractionResult,
        header: &Format,
    ) -> ChartResult<()> {
        let export_err = |e: rust_xlsxwriter::XlsxError| {
            ChartError::Export(format!("Failed to write cell: {}", e))
        };

        worksheet
            .write_string_with_format(0, 0, "Category", header)
            .map_err(export_err)?;
        for (idx, category) in result.categories.iter().enumerate() {
            worksheet
                .write_string_with_format(0, (idx + 1) as u16, category, header)
                .map_err(export_err)?;
        }

        for (row_idx, series) in result.series.iter().enumerate() {
            let row = (row_idx + 1) as u32;
            worksheet
                .write_string(row, 0, &series.name)
                .map_err(export_err)?;
            for (idx, value) in series.data.iter().enumerate() {
                if let Some(v) = value {
                    worksheet
                        .write_number(row, (idx + 1) as u16, *v)
                        .map_err(export_err)?;
                }
            }
        }
        Ok(())
    }
}

/// "<id> <title>" cleaned of forbidden characters, truncated, de-duplicated
fn unique_sheet_name(id: u32, title: &str, used: &mut HashSet<String>) -> String {
    let cleaned: String = format!("{} {}", id, title)
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            other => other,
        })
        .collect();
    let mut name: String = cleaned.trim().chars().take(MAX_SHEET_NAME).collect();
    name = name.trim_end().trim_matches('\'').to_string();

    let mut candidate = name.clone();
    let mut n = 2;
    while !used.insert(candidate.to_lowercase()) {
        let suffix = format!(" ({})", n);
        let keep = MAX_SHEET_NAME.saturating_sub(suffix.chars().count());
        candidate = format!("{}{}", name.chars().take(keep).collect::<String>(), suffix);
        n += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_name_sanitized_and_truncated() {
        let mut used = HashSet::new();
        let name = unique_sheet_name(1, "EVOLUCIÓN DEL PRECIO MEDIO DE ENERGÍA ACTIVA", &mut used);
        assert!(name.chars().count() <= MAX_SHEET_NAME);
        assert!(name.starts_with("1 EVOLUCIÓN"));

        let name = unique_sheet_name(2, "VENTAS (S/MWh)", &mut used);
        assert_eq!(name, "2 VENTAS (S_MWh)");
    }

    #[test]
    fn test_sheet_name_deduplicated() {
        let mut used = HashSet::new();
        let a = unique_sheet_name(9, "Perfil", &mut used);
        let b = unique_sheet_name(9, "perfil", &mut used);
        assert_eq!(a, "9 Perfil");
        assert_eq!(b, "9 perfil (2)");
    }
}
