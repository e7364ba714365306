//! First-sheet workbook loading.
//!
//! The first row of the first sheet is the header. Numeric header cells keep
//! a float rendering ("0.0") so single-age columns exported as floats stay
//! distinguishable from bare integer headers; numeric data cells drop an
//! integral fraction ("10" rather than "10.0").

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Duration, NaiveDate};
use std::path::Path;

use crate::error::{InputError, InputResult};
use crate::models::{format_number, Table};

const SPREADSHEET_EXTENSIONS: [&str; 6] = ["xlsx", "xlsm", "xlsb", "xls", "xla", "ods"];

/// Whether the path names a workbook format we read with calamine.
pub fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SPREADSHEET_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Load the first sheet of a workbook as a [`Table`].
///
/// Errors name the workbook.
pub fn load_first_sheet(path: &Path) -> InputResult<Table> {
    read_first_sheet(path).map_err(|e| e.in_file(path))
}

fn read_first_sheet(path: &Path) -> InputResult<Table> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| InputError::Sheet(format!("cannot open workbook: {}", e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| InputError::Sheet("workbook contains no sheets".to_string()))?
        .map_err(|e| InputError::Sheet(e.to_string()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .ok_or(InputError::Empty)?
        .iter()
        .map(header_text)
        .collect();

    let body = rows
        .map(|row| row.iter().map(cell_text).collect::<Vec<String>>())
        .filter(|cells| cells.iter().any(|c| !c.is_empty()))
        .collect();

    Ok(Table::new(headers, body))
}

/// Render a header cell.
pub fn header_text(cell: &Data) -> String {
    match cell {
        Data::Float(f) if f.is_finite() && f.fract() == 0.0 => format!("{:.1}", f),
        Data::Int(i) => i.to_string(),
        other => super::clean_header(&cell_text(other)),
    }
}

/// Render a data cell.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => format_number(*f),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::Error(e) => format!("{:?}", e),
        Data::DateTime(dt) => excel_serial_to_text(dt.as_f64()),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

/// Convert an Excel serial date (days since 1899-12-30) to text.
///
/// Whole days render as `YYYY-MM-DD`, anything else with a time part.
pub fn excel_serial_to_text(serial: f64) -> String {
    let Some(epoch) = NaiveDate::from_ymd_opt(1899, 12, 30) else {
        return format_number(serial);
    };
    let millis = (serial * 86_400_000.0).round() as i64;
    let Some(stamp) = epoch
        .and_hms_opt(0, 0, 0)
        .zip(Duration::try_milliseconds(millis))
        .and_then(|(start, offset)| start.checked_add_signed(offset))
    else {
        return format_number(serial);
    };

    if serial.fract() == 0.0 {
        stamp.format("%Y-%m-%d").to_string()
    } else {
        stamp.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
