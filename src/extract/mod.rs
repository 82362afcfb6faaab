//! Tabular extractors, one per raw source layout.
//!
//! Each extractor takes the raw content plus a small layout description and
//! returns normalized records sorted by period. Rows that fail to parse are
//! dropped one at a time; they never fail the whole extraction.

pub mod call_records;
pub mod date_keyed;
pub mod named;
pub mod pivoted;
pub mod positional;

use anyhow::{Context, Result};
use calamine::{Data, Reader, open_workbook_auto_from_rs};
use std::io::Cursor;

use crate::period::{Period, parse_year};

/// A worksheet as a dense grid, addressed from cell `A1`.
pub type Sheet = Vec<Vec<Data>>;

/// Loads the first worksheet of an in-memory workbook (xlsx, xls, ods).
///
/// The grid is padded so that `sheet[r][c]` is the cell at row `r`, column
/// `c` of the sheet, even when the used range starts further down.
pub fn read_first_sheet(bytes: &[u8]) -> Result<Sheet> {
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).context("failed to open workbook")?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("workbook has no sheets"))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("failed to read sheet '{sheet_name}'"))?;

    let Some((row_offset, col_offset)) = range.start() else {
        return Ok(Vec::new());
    };

    let mut sheet: Sheet = vec![Vec::new(); row_offset as usize];
    for row in range.rows() {
        let mut cells = vec![Data::Empty; col_offset as usize];
        cells.extend(row.iter().cloned());
        sheet.push(cells);
    }
    Ok(sheet)
}

/// Lenient number parsing for CSV and text cells.
///
/// Trims, strips `$` and thousands separators, and rejects anything with
/// letters in it (FRED writes `.` for missing values, Realtor.com writes
/// quality notes in trailing rows).
pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.trim().trim_start_matches('$');
    if s.is_empty() || s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let value: f64 = s.replace(',', "").parse().ok()?;
    value.is_finite().then_some(value)
}

/// A cell holding a number, either natively or as text.
pub fn cell_number(cell: &Data) -> Option<f64> {
    match cell {
        Data::String(s) => parse_number(s),
        other => native_number(other),
    }
}

/// A cell whose native type is numeric. Text that looks like a number does
/// not count.
pub fn native_number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) if f.is_finite() => Some(*f),
        Data::Int(i) => Some(*i as f64),
        _ => None,
    }
}

/// Trimmed, non-empty text content.
pub fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) if f.fract() == 0.0 => Some(format!("{f:.0}")),
        Data::Float(f) => Some(f.to_string()),
        _ => None,
    }
}

/// A four-digit year cell, stored either as a number or as text.
pub fn cell_year(cell: &Data) -> Option<i32> {
    match cell {
        Data::Float(f) if f.fract() == 0.0 && (1000.0..=9999.0).contains(f) => Some(*f as i32),
        Data::Int(i) if (1000..=9999).contains(i) => Some(*i as i32),
        Data::String(s) if s.trim().len() == 4 => parse_year(s),
        _ => None,
    }
}

/// Interprets a date-like cell as a month.
pub fn cell_period(cell: &Data) -> Option<Period> {
    match cell {
        Data::DateTime(dt) => Period::from_excel_serial(dt.as_f64()),
        Data::DateTimeIso(s) | Data::String(s) => Period::parse(s),
        Data::Int(i) if (100_000..=999_999).contains(i) => Period::from_yyyymm(*i),
        Data::Int(i) => Period::from_excel_serial(*i as f64),
        Data::Float(f) if f.fract() == 0.0 && (100_000.0..=999_999.0).contains(f) => {
            Period::from_yyyymm(*f as i64)
        }
        Data::Float(f) => Period::from_excel_serial(*f),
        _ => None,
    }
}

/// Converts a parsed number into a count. Counts are whole and non-negative.
pub(crate) fn as_count(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 0.0).then(|| value.round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number_is_forgiving() {
        assert_eq!(parse_number(" 1,234.5 "), Some(1234.5));
        assert_eq!(parse_number("$350,000"), Some(350000.0));
        assert_eq!(parse_number("4.2"), Some(4.2));
        assert_eq!(parse_number("."), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("n/a"), None);
        assert_eq!(parse_number("NaN"), None);
    }

    #[test]
    fn test_native_number_ignores_text() {
        assert_eq!(native_number(&Data::Float(12.0)), Some(12.0));
        assert_eq!(native_number(&Data::Int(7)), Some(7.0));
        assert_eq!(native_number(&Data::String("12".into())), None);
        assert_eq!(cell_number(&Data::String("12".into())), Some(12.0));
    }

    #[test]
    fn test_cell_year() {
        assert_eq!(cell_year(&Data::Float(2015.0)), Some(2015));
        assert_eq!(cell_year(&Data::Int(2016)), Some(2016));
        assert_eq!(cell_year(&Data::String(" 2017 ".into())), Some(2017));
        assert_eq!(cell_year(&Data::String("Orleans".into())), None);
        assert_eq!(cell_year(&Data::Float(2015.5)), None);
        assert_eq!(cell_year(&Data::Empty), None);
    }

    #[test]
    fn test_cell_period() {
        let jan_2015 = Period::new(2015, 1).unwrap();
        assert_eq!(cell_period(&Data::Float(42005.0)), Some(jan_2015));
        assert_eq!(cell_period(&Data::Int(201501)), Some(jan_2015));
        assert_eq!(cell_period(&Data::Float(201501.0)), Some(jan_2015));
        assert_eq!(cell_period(&Data::Float(201513.0)), None);
        assert_eq!(cell_period(&Data::String("2015-01-01".into())), Some(jan_2015));
        assert_eq!(
            cell_period(&Data::DateTimeIso("2015-01-01T00:00:00".into())),
            Some(jan_2015)
        );
        assert_eq!(cell_period(&Data::Empty), None);
    }

    #[test]
    fn test_as_count() {
        assert_eq!(as_count(3.0), Some(3));
        assert_eq!(as_count(0.0), Some(0));
        assert_eq!(as_count(-1.0), None);
        assert_eq!(as_count(f64::INFINITY), None);
    }
}
