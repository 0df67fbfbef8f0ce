//! Spreadsheet text extraction via `calamine`.
//!
//! Each sheet becomes one text block: rows joined one per line, cells
//! joined with `" | "` after dropping empty cells, rows dropped entirely
//! when nothing survives the filter. The combined text concatenates sheet
//! blocks under `=== HOJA: <name> ===` headers.

use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use serde::Serialize;

use crate::error::{ExtractError, Result};

/// One non-empty sheet's extracted content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetBlock {
    pub name: String,
    pub content: String,
}

/// The result of extracting a whole workbook.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetExtraction {
    /// Concatenation of all sheet blocks with section headers.
    pub text: String,
    /// Count of sheets that contained data.
    pub sheets: usize,
    /// Names of every sheet in the workbook, empty ones included.
    #[serde(rename = "sheetNames")]
    pub sheet_names: Vec<String>,
    /// Per-sheet content for sheets that contained data.
    pub details: Vec<SheetBlock>,
}

/// Extract text from an in-memory spreadsheet (xlsx/xls/ods).
///
/// # Errors
///
/// Returns [`ExtractError::Parse`] when the workbook cannot be opened or
/// a worksheet range cannot be read.
pub fn extract_spreadsheet(bytes: &[u8]) -> Result<SheetExtraction> {
    tracing::debug!(size = bytes.len(), "extracting spreadsheet");

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| {
        tracing::error!(error = %e, "workbook open failed");
        ExtractError::Parse { format: "spreadsheet", message: e.to_string() }
    })?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let mut details = Vec::new();
    let mut all_text = String::new();

    for name in &sheet_names {
        let range = match workbook.worksheet_range(name) {
            Ok(r) => r,
            Err(e) => {
                return Err(ExtractError::Parse {
                    format: "spreadsheet",
                    message: format!("sheet '{name}': {e}"),
                });
            }
        };

        let lines: Vec<String> = range
            .rows()
            .filter_map(|row| row_to_line(row.iter().map(cell_to_string)))
            .collect();
        let content = lines.join("\n");

        if content.trim().is_empty() {
            continue;
        }

        all_text.push_str(&format!("\n\n=== HOJA: {name} ===\n\n{content}"));
        details.push(SheetBlock { name: name.clone(), content });
    }

    tracing::debug!(sheets = details.len(), total = sheet_names.len(), "spreadsheet extracted");

    Ok(SheetExtraction {
        text: all_text.trim().to_string(),
        sheets: details.len(),
        sheet_names,
        details,
    })
}

/// Join one row's cells with `" | "`, dropping empty cells.
///
/// Returns `None` when the row has no content left after filtering.
fn row_to_line(cells: impl Iterator<Item = String>) -> Option<String> {
    let kept: Vec<String> = cells.filter(|c| !c.is_empty()).collect();
    if kept.is_empty() || kept.iter().all(|c| c.trim().is_empty()) {
        return None;
    }
    Some(kept.join(" | "))
}

/// Render a calamine cell as text. Whole-number floats print without the
/// trailing `.0` so amounts read like the source sheet.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::Error(e) => format!("#ERR:{e:?}"),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cells_are_dropped_before_joining() {
        let row = vec!["Factura".to_string(), String::new(), "1500".to_string()];
        assert_eq!(row_to_line(row.into_iter()).unwrap(), "Factura | 1500");
    }

    #[test]
    fn rows_left_empty_after_filtering_are_dropped() {
        let row = vec![String::new(), String::new()];
        assert_eq!(row_to_line(row.into_iter()), None);

        let blank = vec!["   ".to_string()];
        assert_eq!(row_to_line(blank.into_iter()), None);
    }

    #[test]
    fn whole_number_floats_render_without_fraction() {
        assert_eq!(cell_to_string(&Data::Float(1500.0)), "1500");
        assert_eq!(cell_to_string(&Data::Float(12.5)), "12.5");
        assert_eq!(cell_to_string(&Data::Int(7)), "7");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }

    #[test]
    fn corrupt_workbook_is_a_parse_error() {
        let err = extract_spreadsheet(b"not a workbook").unwrap_err();
        assert!(matches!(err, ExtractError::Parse { format: "spreadsheet", .. }));
    }
}
