use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use rust_xlsxwriter::{Format, Workbook};
use tracing::{debug, warn};

use crate::error::{CampError, Result};
use crate::models::CellValue;

/// Excel's limit on sheet name length
const MAX_SHEET_NAME_LEN: usize = 31;

/// Characters Excel refuses in sheet names
const ILLEGAL_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Number formats for date cells; the reader recognises these as dates again
const DATE_FORMAT: &str = "yyyy-mm-dd";
const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";
const DURATION_FORMAT: &str = "[h]:mm:ss";

/// One worksheet: header row plus data rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.trim() == name)
    }
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) if dt.is_duration() => CellValue::Duration(dt.as_f64()),
        Data::DateTime(dt) => CellValue::DateTime(dt.as_f64()),
        Data::DateTimeIso(raw) => {
            CellValue::from_iso_datetime(raw).unwrap_or_else(|| CellValue::Text(raw.clone()))
        }
        // Error cells (`#N/A`, `#DIV/0!`) and ISO durations keep their display text
        other => CellValue::Text(other.to_string()),
    }
}

fn sheet_from_range(name: &str, range: &Range<Data>) -> Sheet {
    let mut rows = range.rows();
    let columns = rows
        .next()
        .map(|header| header.iter().map(|c| c.to_string()).collect())
        .unwrap_or_default();
    let rows = rows
        .map(|row| row.iter().map(cell_value).collect())
        .collect();

    Sheet {
        name: name.to_string(),
        columns,
        rows,
    }
}

fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(CampError::FileNotFound(path.to_path_buf()))
    }
}

/// Read every sheet of a workbook, in workbook order.
pub fn read_workbook(path: &Path) -> Result<Vec<Sheet>> {
    ensure_exists(path)?;
    let mut workbook = open_workbook_auto(path)?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name)?;
        let sheet = sheet_from_range(&name, &range);
        debug!(path = %path.display(), sheet = %name, rows = sheet.rows.len(), "Read sheet");
        sheets.push(sheet);
    }
    Ok(sheets)
}

/// Read a single named sheet.
pub fn read_sheet(path: &Path, name: &str) -> Result<Sheet> {
    ensure_exists(path)?;
    let mut workbook = open_workbook_auto(path)?;

    if !workbook.sheet_names().iter().any(|s| s == name) {
        return Err(CampError::SheetNotFound {
            path: path.to_path_buf(),
            sheet: name.to_string(),
        });
    }

    let range = workbook.worksheet_range(name)?;
    let sheet = sheet_from_range(name, &range);
    debug!(path = %path.display(), sheet = %name, rows = sheet.rows.len(), "Read sheet");
    Ok(sheet)
}

/// Make a name acceptable to Excel: no illegal characters, at most 31 characters.
pub fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if ILLEGAL_SHEET_CHARS.contains(&c) { '_' } else { c })
        .take(MAX_SHEET_NAME_LEN)
        .collect();
    let cleaned = cleaned.trim_matches('\'').trim().to_string();
    if cleaned.is_empty() {
        "Sheet".to_string()
    } else {
        cleaned
    }
}

/// The sanitised name when it differs from `name`, `None` when Excel accepts
/// the name as is.
pub fn renamed_sheet_name(name: &str) -> Option<String> {
    let sheet = sanitize_sheet_name(name);
    (sheet != name).then_some(sheet)
}

/// Write sheets in order, header row in bold. Parent directories are created.
/// Dates, durations and booleans are written as native cells.
pub fn write_workbook(path: &Path, sheets: &[Sheet]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let date = Format::new().set_num_format(DATE_FORMAT);
    let datetime = Format::new().set_num_format(DATETIME_FORMAT);
    let duration = Format::new().set_num_format(DURATION_FORMAT);

    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        let name = match renamed_sheet_name(&sheet.name) {
            Some(renamed) => {
                warn!(original = %sheet.name, sheet = %renamed, "Sheet name changed to satisfy Excel rules");
                renamed
            }
            None => sheet.name.clone(),
        };
        worksheet.set_name(name)?;

        for (col, title) in sheet.columns.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, title, &header)?;
        }

        for (r, row) in sheet.rows.iter().enumerate() {
            let row_num = (r + 1) as u32;
            for (col, cell) in row.iter().enumerate() {
                match cell {
                    CellValue::Empty => {}
                    CellValue::Text(s) => {
                        worksheet.write_string(row_num, col as u16, s)?;
                    }
                    CellValue::Number(n) => {
                        worksheet.write_number(row_num, col as u16, *n)?;
                    }
                    CellValue::Bool(b) => {
                        worksheet.write_boolean(row_num, col as u16, *b)?;
                    }
                    CellValue::DateTime(serial) => {
                        let format = if serial.fract() == 0.0 { &date } else { &datetime };
                        worksheet.write_number_with_format(row_num, col as u16, *serial, format)?;
                    }
                    CellValue::Duration(days) => {
                        worksheet.write_number_with_format(row_num, col as u16, *days, &duration)?;
                    }
                }
            }
        }
    }

    // rust_xlsxwriter refuses to save an empty workbook
    if sheets.is_empty() {
        workbook.add_worksheet();
    }

    workbook.save(path)?;
    debug!(path = %path.display(), sheets = sheets.len(), "Wrote workbook");
    Ok(())
}
