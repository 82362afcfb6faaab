//! Spreadsheet with one row per month: a date column and a count column,
//! located by their header text (murders, crimes).

use calamine::Data;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::{as_count, cell_number, cell_period, cell_text};
use crate::period::Period;
use crate::records::MonthlyCount;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateKeyedLayout {
    pub date_column: String,
    pub value_column: String,
}

impl DateKeyedLayout {
    pub fn new(date_column: impl Into<String>, value_column: impl Into<String>) -> Self {
        Self {
            date_column: date_column.into(),
            value_column: value_column.into(),
        }
    }
}

/// Extracts monthly counts from a sheet whose first non-empty row is the header.
///
/// Rows need both a date cell and a numeric count cell. Months before
/// `floor` are dropped. If a month repeats, the first row wins.
pub fn extract(sheet: &[Vec<Data>], layout: &DateKeyedLayout, floor: Period) -> Vec<MonthlyCount> {
    let Some(header_idx) = sheet
        .iter()
        .position(|row| row.iter().any(|cell| cell_text(cell).is_some()))
    else {
        return Vec::new();
    };
    let header = &sheet[header_idx];

    let find = |name: &str| {
        header
            .iter()
            .position(|cell| cell_text(cell).is_some_and(|text| text == name))
    };
    let (Some(date_col), Some(value_col)) = (find(&layout.date_column), find(&layout.value_column))
    else {
        warn!(
            date_column = %layout.date_column,
            value_column = %layout.value_column,
            "Header columns not found"
        );
        return Vec::new();
    };

    let mut by_period: BTreeMap<Period, u64> = BTreeMap::new();
    let mut dropped = 0usize;

    for row in &sheet[header_idx + 1..] {
        let period = row.get(date_col).and_then(cell_period);
        let count = row.get(value_col).and_then(cell_number).and_then(as_count);
        match (period, count) {
            (Some(period), Some(count)) if period >= floor => {
                by_period.entry(period).or_insert(count);
            }
            (Some(_), Some(_)) => {}
            _ => dropped += 1,
        }
    }

    debug!(kept = by_period.len(), dropped, "Date-keyed sheet extracted");

    by_period
        .into_iter()
        .map(|(period, count)| MonthlyCount { period, count })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Data {
        Data::String(s.to_string())
    }

    fn layout() -> DateKeyedLayout {
        DateKeyedLayout::new("Month", "Murders")
    }

    fn floor() -> Period {
        Period::new(2015, 1).unwrap()
    }

    #[test]
    fn test_extracts_rows_at_or_after_floor() {
        let sheet = vec![
            vec![text("Month"), text("Murders")],
            vec![Data::Float(41974.0), Data::Float(14.0)], // 2014-12
            vec![Data::Float(42005.0), Data::Float(12.0)], // 2015-01
            vec![text("2015-02-01"), text("9")],
        ];

        let rows = extract(&sheet, &layout(), floor());

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].period.to_string(), "2015-01");
        assert_eq!(rows[0].count, 12);
        assert_eq!(rows[1].period.to_string(), "2015-02");
        assert_eq!(rows[1].count, 9);
    }

    #[test]
    fn test_header_may_start_below_blank_rows_and_columns_may_move() {
        let sheet = vec![
            vec![],
            vec![Data::Empty, text("Murders"), text("Notes"), text("Month")],
            vec![Data::Empty, Data::Int(20), text("spike"), text("2016-07-01")],
        ];

        let rows = extract(&sheet, &layout(), floor());

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].period.to_string(), "2016-07");
        assert_eq!(rows[0].count, 20);
    }

    #[test]
    fn test_rows_missing_a_cell_are_dropped() {
        let sheet = vec![
            vec![text("Month"), text("Murders")],
            vec![text("2016-01-01")],
            vec![Data::Empty, Data::Float(3.0)],
            vec![text("2016-02-01"), text("unknown")],
            vec![text("2016-03-01"), Data::Float(-4.0)],
            vec![text("2016-04-01"), Data::Float(0.0)],
        ];

        let rows = extract(&sheet, &layout(), floor());

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].period.to_string(), "2016-04");
        assert_eq!(rows[0].count, 0);
    }

    #[test]
    fn test_out_of_range_date_cell_drops_only_its_row() {
        let sheet = vec![
            vec![text("Month"), text("Murders")],
            vec![Data::Float(1e15), Data::Float(8.0)],
            vec![Data::Int(i64::MAX), Data::Float(6.0)],
            vec![Data::Float(42005.0), Data::Float(12.0)],
            vec![Data::Float(201502.0), Data::Float(9.0)],
        ];

        let rows = extract(&sheet, &layout(), floor());

        let periods: Vec<String> = rows.iter().map(|r| r.period.to_string()).collect();
        assert_eq!(periods, vec!["2015-01", "2015-02"]);
        assert_eq!(rows[1].count, 9);
    }

    #[test]
    fn test_duplicate_month_keeps_first_and_output_is_sorted() {
        let sheet = vec![
            vec![text("Month"), text("Murders")],
            vec![text("2016-03-01"), Data::Float(5.0)],
            vec![text("2016-01-01"), Data::Float(7.0)],
            vec![text("2016-03-15"), Data::Float(99.0)],
        ];

        let rows = extract(&sheet, &layout(), floor());

        let periods: Vec<String> = rows.iter().map(|r| r.period.to_string()).collect();
        assert_eq!(periods, vec!["2016-01", "2016-03"]);
        assert_eq!(rows[1].count, 5);
    }

    #[test]
    fn test_missing_header_column_yields_nothing() {
        let sheet = vec![
            vec![text("Date"), text("Homicides")],
            vec![text("2016-03-01"), Data::Float(5.0)],
        ];

        assert!(extract(&sheet, &layout(), floor()).is_empty());
        assert!(extract(&[], &layout(), floor()).is_empty());
    }
}
