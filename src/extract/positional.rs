//! Delimited text read by field index (FRED-style `DATE,VALUE` series:
//! unemployment, household income, population).

use anyhow::Result;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::BTreeMap;
use tracing::debug;

use super::parse_number;
use crate::period::{Period, parse_year};
use crate::records::{AnnualValue, MonthlyValue};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldLayout {
    pub date_field: usize,
    pub value_field: usize,
    /// Multiplier applied on ingest, e.g. `1000.0` for values in thousands.
    pub scale: f64,
    pub delimiter: u8,
}

impl Default for FieldLayout {
    fn default() -> Self {
        Self {
            date_field: 0,
            value_field: 1,
            scale: 1.0,
            delimiter: b',',
        }
    }
}

impl FieldLayout {
    pub fn scaled(scale: f64) -> Self {
        Self {
            scale,
            ..Self::default()
        }
    }
}

/// Iterates `(date, value)` pairs after the header line, skipping lines
/// whose fields are missing or whose value is not numeric.
fn pairs<'a>(bytes: &'a [u8], layout: &'a FieldLayout) -> impl Iterator<Item = (String, f64)> + 'a {
    let reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .delimiter(layout.delimiter)
        .from_reader(bytes);

    reader
        .into_records()
        .filter_map(|result| result.ok())
        .filter_map(move |record: StringRecord| {
            let date = record.get(layout.date_field)?.to_string();
            let value = parse_number(record.get(layout.value_field)?)? * layout.scale;
            Some((date, value))
        })
}

/// Monthly series. Lines with an unparseable month or value are dropped.
///
/// # Errors
///
/// Never fails on malformed lines; the `Result` is kept so callers treat
/// every extractor alike.
pub fn extract_monthly(bytes: &[u8], layout: &FieldLayout, floor: Period) -> Result<Vec<MonthlyValue>> {
    let mut by_period: BTreeMap<Period, f64> = BTreeMap::new();
    for (date, value) in pairs(bytes, layout) {
        let Some(period) = Period::parse(&date) else {
            continue;
        };
        if period >= floor {
            by_period.entry(period).or_insert(value);
        }
    }

    debug!(months = by_period.len(), "Monthly series extracted");
    Ok(by_period
        .into_iter()
        .map(|(period, value)| MonthlyValue { period, value })
        .collect())
}

/// Annual series keyed by the leading year of the date field.
///
/// # Errors
///
/// See [`extract_monthly`].
pub fn extract_annual(bytes: &[u8], layout: &FieldLayout, floor: Period) -> Result<Vec<AnnualValue>> {
    let mut by_year: BTreeMap<i32, f64> = BTreeMap::new();
    for (date, value) in pairs(bytes, layout) {
        let Some(year) = parse_year(&date) else {
            continue;
        };
        if year >= floor.year() {
            by_year.entry(year).or_insert(value);
        }
    }

    debug!(years = by_year.len(), "Annual series extracted");
    Ok(by_year
        .into_iter()
        .map(|(year, value)| AnnualValue { year, value })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor() -> Period {
        Period::new(2015, 1).unwrap()
    }

    #[test]
    fn test_monthly_rates_drop_unparseable_values() {
        let csv = "\
observation_date,LAORLE1URN
2014-12-01,6.1
2015-01-01,6.3
2015-02-01,.
2015-03-01,5.8
not-a-date,5.0
";

        let rows = extract_monthly(csv.as_bytes(), &FieldLayout::default(), floor()).unwrap();

        let periods: Vec<String> = rows.iter().map(|r| r.period.to_string()).collect();
        assert_eq!(periods, vec!["2015-01", "2015-03"]);
        assert_eq!(rows[0].value, 6.3);
        assert_eq!(rows[1].value, 5.8);
    }

    #[test]
    fn test_zero_rate_is_kept() {
        let csv = "DATE,RATE\n2020-04-01,0\n";
        let rows = extract_monthly(csv.as_bytes(), &FieldLayout::default(), floor()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, 0.0);
    }

    #[test]
    fn test_annual_is_sorted_and_floored() {
        let csv = "\
DATE,MHILA22071A052NCEN
2019-01-01,45615
2014-01-01,37146
2016-01-01,39077
";

        let rows = extract_annual(csv.as_bytes(), &FieldLayout::default(), floor()).unwrap();

        let years: Vec<i32> = rows.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2016, 2019]);
        assert_eq!(rows[1].value, 45615.0);
    }

    #[test]
    fn test_scale_applies_to_population_in_thousands() {
        let csv = "DATE,LAORLE5POP\n2015-01-01,389.617\n2016-01-01,391.495\n";

        let rows = extract_annual(csv.as_bytes(), &FieldLayout::scaled(1000.0), floor()).unwrap();

        assert_eq!(rows.len(), 2);
        assert!((rows[0].value - 389_617.0).abs() < 1e-6);
        assert!((rows[1].value - 391_495.0).abs() < 1e-6);
    }

    #[test]
    fn test_custom_field_positions_and_delimiter() {
        let csv = "rate;date\n4.5;2018-06-01\n";
        let layout = FieldLayout {
            date_field: 1,
            value_field: 0,
            scale: 1.0,
            delimiter: b';',
        };

        let rows = extract_monthly(csv.as_bytes(), &layout, floor()).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].period.to_string(), "2018-06");
        assert_eq!(rows[0].value, 4.5);
    }

    #[test]
    fn test_empty_and_header_only() {
        assert!(extract_monthly(b"", &FieldLayout::default(), floor()).unwrap().is_empty());
        assert!(
            extract_annual(b"DATE,VALUE\n", &FieldLayout::default(), floor())
                .unwrap()
                .is_empty()
        );
    }
}
