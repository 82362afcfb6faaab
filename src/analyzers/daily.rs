//! Roll-up of a pre-aggregated daily response-time CSV into monthly rows.
//!
//! Per month: incident-weighted mean of the daily averages, plus median and
//! p90 over the sorted per-day values. Per-call detail is not available, so
//! the bundle carries no breakdowns and no distribution.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use std::collections::BTreeMap;
use tracing::debug;

use crate::analyzers::types::{MonthlyResponse, ResponseSummary, ResponseTimes};
use crate::analyzers::utility::{median_sorted, p90_sorted, sorted, weighted_mean};
use crate::extract::parse_number;
use crate::period::Period;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyColumns {
    pub date: String,
    pub incidents: String,
    pub avg_minutes: String,
}

impl Default for DailyColumns {
    fn default() -> Self {
        Self {
            date: "date".to_string(),
            incidents: "incident_count".to_string(),
            avg_minutes: "avg_response_minutes".to_string(),
        }
    }
}

/// One parsed day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyRow {
    pub period: Period,
    pub incidents: f64,
    pub avg_minutes: f64,
}

/// Reads the daily rows at or after `floor`. Lines with an unparseable
/// date, a non-positive incident count, or a non-numeric average are
/// skipped.
///
/// # Errors
///
/// Returns an error if the header lacks one of the configured columns.
pub fn read_daily(bytes: &[u8], columns: &DailyColumns, floor: Period) -> Result<Vec<DailyRow>> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(bytes);

    let headers = reader.headers().context("failed to read header row")?.clone();
    if headers.is_empty() {
        return Ok(Vec::new());
    }
    let position = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("column '{name}' not found in header"))
    };
    let date_idx = position(&columns.date)?;
    let incidents_idx = position(&columns.incidents)?;
    let minutes_idx = position(&columns.avg_minutes)?;

    let rows: Vec<DailyRow> = reader
        .records()
        .filter_map(|result| result.ok())
        .filter_map(|record| {
            let period = Period::parse(record.get(date_idx)?)?;
            let incidents = parse_number(record.get(incidents_idx)?).filter(|n| *n > 0.0)?;
            let avg_minutes = parse_number(record.get(minutes_idx)?)?;
            (period >= floor).then_some(DailyRow {
                period,
                incidents,
                avg_minutes,
            })
        })
        .collect();

    debug!(days = rows.len(), "Daily response rows read");
    Ok(rows)
}

/// Rolls daily rows up into the response-time bundle.
pub fn roll_up(rows: &[DailyRow]) -> ResponseTimes {
    let mut months: BTreeMap<Period, Vec<(f64, f64)>> = BTreeMap::new();
    for row in rows {
        months
            .entry(row.period)
            .or_default()
            .push((row.avg_minutes, row.incidents));
    }

    let monthly: Vec<MonthlyResponse> = months
        .into_iter()
        .filter_map(|(month, days)| {
            let values: Vec<f64> = days.iter().map(|(minutes, _)| *minutes).collect();
            let ordered = sorted(&values);
            let incidents: f64 = days.iter().map(|(_, weight)| weight).sum();
            Some(MonthlyResponse {
                month,
                median_response: median_sorted(&ordered)?,
                mean_response: weighted_mean(&days)?,
                p90_response: p90_sorted(&ordered)?,
                call_count: incidents.round() as u64,
                median_total: None,
                emergency_median: None,
                emergency_mean: None,
                emergency_p90: None,
                non_emergency_median: None,
                non_emergency_mean: None,
                non_emergency_p90: None,
            })
        })
        .collect();

    let daily_values: Vec<f64> = rows.iter().map(|r| r.avg_minutes).collect();
    let latest = monthly.last();
    let summary = ResponseSummary {
        total_calls: monthly.iter().map(|m| m.call_count).sum(),
        overall_median: median_sorted(&sorted(&daily_values)).unwrap_or(0.0),
        emergency_median: 0.0,
        latest_month: latest.map(|m| m.month.to_string()).unwrap_or_default(),
        latest_median: latest.map_or(0.0, |m| m.median_response),
    };

    ResponseTimes {
        monthly,
        summary,
        ..ResponseTimes::default()
    }
}
