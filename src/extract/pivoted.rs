//! Spreadsheet with months pivoted across columns (active residential
//! addresses).
//!
//! Two stacked header rows describe each column: a sparse year row, only set
//! where a new year starts, and a dense month-name row. A single data row
//! further down holds the counts.

use calamine::Data;
use tracing::debug;

use super::{as_count, cell_text, cell_year, native_number};
use crate::period::Period;
use crate::records::MonthlyCount;

/// Row and column offsets of the pivot table, zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PivotLayout {
    pub year_row: usize,
    pub month_row: usize,
    pub value_row: usize,
    /// First data column; earlier columns hold row labels.
    pub first_column: usize,
}

impl Default for PivotLayout {
    /// The Data Center workbook: years on row 5, months on row 6, Orleans
    /// Parish totals on row 8, labels in column A.
    fn default() -> Self {
        Self {
            year_row: 4,
            month_row: 5,
            value_row: 7,
            first_column: 1,
        }
    }
}

/// Left fold over the year header: each column gets the last year seen at or
/// before it, `None` until the first year cell.
pub fn forward_fill_years(year_row: &[Data], columns: std::ops::Range<usize>) -> Vec<Option<i32>> {
    columns
        .scan(None, |last_year, col| {
            if let Some(year) = year_row.get(col).and_then(cell_year) {
                *last_year = Some(year);
            }
            Some(*last_year)
        })
        .collect()
}

/// Rebuilds the monthly series from the pivot.
///
/// Columns without a known year, a recognised month name, or a numeric
/// count are skipped. The result is sorted by period with duplicates
/// removed (first column wins).
pub fn extract(sheet: &[Vec<Data>], layout: &PivotLayout, floor: Period) -> Vec<MonthlyCount> {
    let empty: &[Data] = &[];
    let row = |idx: usize| sheet.get(idx).map(Vec::as_slice).unwrap_or(empty);
    let (year_row, month_row, value_row) = (row(layout.year_row), row(layout.month_row), row(layout.value_row));

    let columns = layout.first_column..value_row.len().max(layout.first_column);
    let years = forward_fill_years(year_row, columns.clone());

    let mut points: Vec<MonthlyCount> = columns
        .zip(years)
        .filter_map(|(col, year)| {
            let month_name = month_row.get(col).and_then(cell_text)?;
            let period = Period::from_year_and_month_name(year?, &month_name)?;
            let count = value_row.get(col).and_then(native_number).and_then(as_count)?;
            Some(MonthlyCount { period, count })
        })
        .filter(|point| point.period >= floor)
        .collect();

    points.sort_by_key(|point| point.period);
    points.dedup_by_key(|point| point.period);

    debug!(months = points.len(), "Pivoted sheet extracted");
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Data {
        Data::String(s.to_string())
    }

    fn layout() -> PivotLayout {
        PivotLayout {
            year_row: 0,
            month_row: 1,
            value_row: 2,
            first_column: 1,
        }
    }

    fn floor() -> Period {
        Period::new(2015, 1).unwrap()
    }

    fn periods(points: &[MonthlyCount]) -> Vec<String> {
        points.iter().map(|p| p.period.to_string()).collect()
    }

    #[test]
    fn test_year_forward_fills_across_gap() {
        let sheet = vec![
            vec![Data::Empty, Data::Float(2015.0), Data::Empty, Data::Empty, Data::Float(2016.0)],
            vec![Data::Empty, text("Jan"), text("Feb"), text("Mar"), text("Jan")],
            vec![
                text("Orleans"),
                Data::Float(100.0),
                Data::Float(110.0),
                Data::Float(120.0),
                Data::Float(200.0),
            ],
        ];

        let points = extract(&sheet, &layout(), floor());

        assert_eq!(periods(&points), vec!["2015-01", "2015-02", "2015-03", "2016-01"]);
        let counts: Vec<u64> = points.iter().map(|p| p.count).collect();
        assert_eq!(counts, vec![100, 110, 120, 200]);
    }

    #[test]
    fn test_forward_fill_in_isolation() {
        let year_row = vec![
            text("Year"),
            Data::Empty,
            Data::Int(2015),
            Data::Empty,
            text("2016"),
            Data::Empty,
        ];

        let filled = forward_fill_years(&year_row, 1..6);

        assert_eq!(filled, vec![None, Some(2015), Some(2015), Some(2016), Some(2016)]);
    }

    #[test]
    fn test_june_synonym_and_non_numeric_counts() {
        let sheet = vec![
            vec![Data::Empty, Data::Float(2019.0)],
            vec![Data::Empty, text("May"), text("June"), text("Jul"), text("Total")],
            vec![
                Data::Empty,
                Data::Float(1.0),
                Data::Float(2.0),
                text("3"),
                Data::Float(6.0),
            ],
        ];

        let points = extract(&sheet, &layout(), floor());

        // "3" is text, not a number; "Total" is not a month.
        assert_eq!(periods(&points), vec!["2019-05", "2019-06"]);
    }

    #[test]
    fn test_columns_before_first_year_and_floor_are_dropped() {
        let sheet = vec![
            vec![Data::Empty, Data::Empty, Data::Float(2014.0), Data::Empty, Data::Float(2015.0)],
            vec![Data::Empty, text("Dec"), text("Nov"), text("Dec"), text("Jan")],
            vec![
                Data::Empty,
                Data::Float(1.0),
                Data::Float(2.0),
                Data::Float(3.0),
                Data::Float(4.0),
            ],
        ];

        let points = extract(&sheet, &layout(), floor());

        assert_eq!(periods(&points), vec!["2015-01"]);
    }

    #[test]
    fn test_output_is_resorted() {
        let sheet = vec![
            vec![Data::Empty, Data::Float(2017.0), Data::Empty, Data::Float(2016.0)],
            vec![Data::Empty, text("Feb"), text("Jan"), text("Dec")],
            vec![Data::Empty, Data::Float(1.0), Data::Float(2.0), Data::Float(3.0)],
        ];

        let points = extract(&sheet, &layout(), floor());

        assert_eq!(periods(&points), vec!["2016-12", "2017-01", "2017-02"]);
    }

    #[test]
    fn test_short_sheet_is_empty() {
        let sheet = vec![vec![Data::Float(2015.0)]];
        assert!(extract(&sheet, &PivotLayout::default(), floor()).is_empty());
    }
}
