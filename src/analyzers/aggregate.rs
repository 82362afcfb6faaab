use crate::analyzers::distribution::{bucket_index, histogram};
use crate::analyzers::types::{
    DistrictResponse, MonthlyResponse, PriorityResponse, ResponseSummary, ResponseTimes,
    TypeResponse,
};
use crate::analyzers::utility::{SampleStats, median_sorted, sorted};
use crate::extract::call_records::CallRecord;
use crate::period::Period;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use tracing::debug;

/// Number of call types kept in `byType`.
pub const TOP_TYPES: usize = 15;
/// Number of priority codes kept in `byPriority`.
pub const TOP_PRIORITIES: usize = 10;

/// A call that survived validation, reduced to what the aggregation needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidCall {
    pub period: Period,
    /// Dispatch → arrival, in minutes.
    pub response: f64,
    /// Creation → arrival, in minutes.
    pub total: Option<f64>,
    pub emergency: bool,
    pub district: Option<i64>,
    pub call_type: Option<String>,
    pub priority: Option<String>,
}

/// Priority codes starting with `0` or `1` are emergencies.
pub fn is_emergency(priority: Option<&str>) -> bool {
    priority.is_some_and(|p| p.starts_with(['0', '1']))
}

/// A response time is valid in `(0, 180]` minutes.
pub fn is_valid_response(minutes: f64) -> bool {
    bucket_index(minutes).is_some()
}

fn minutes_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    (to - from).num_milliseconds() as f64 / 60_000.0
}

/// Validates one record. The record needs a creation time at or after
/// `floor` and a valid dispatch → arrival interval; its month is the month
/// of creation.
pub fn classify(record: &CallRecord, floor: Period) -> Option<ValidCall> {
    let created = record.created?;
    let period = Period::from_date(created.date())?;
    if period < floor {
        return None;
    }

    let arrived = record.arrived?;
    let response = minutes_between(record.dispatched?, arrived);
    if !is_valid_response(response) {
        return None;
    }

    Some(ValidCall {
        period,
        response,
        total: Some(minutes_between(created, arrived)),
        emergency: is_emergency(record.priority.as_deref()),
        district: record.district,
        call_type: record.type_text.clone(),
        priority: record.priority.clone(),
    })
}

#[derive(Default)]
struct MonthGroup {
    all: Vec<f64>,
    totals: Vec<f64>,
    emergency: Vec<f64>,
    non_emergency: Vec<f64>,
}

/// Builds the complete response-time bundle from raw call records.
///
/// Returns the placeholder bundle when no record is valid.
pub fn aggregate_calls(records: &[CallRecord], floor: Period) -> ResponseTimes {
    let calls: Vec<ValidCall> = records.iter().filter_map(|r| classify(r, floor)).collect();
    debug!(
        records = records.len(),
        valid = calls.len(),
        "Call records classified"
    );
    aggregate_valid(&calls)
}

/// Builds the bundle from already validated calls.
pub fn aggregate_valid(calls: &[ValidCall]) -> ResponseTimes {
    if calls.is_empty() {
        return ResponseTimes::placeholder();
    }

    let monthly = monthly_rows(calls);

    let mut by_district: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
    let mut by_type: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    let mut by_priority: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for call in calls {
        if let Some(district) = call.district.filter(|d| *d > 0) {
            by_district.entry(district).or_default().push(call.response);
        }
        if let Some(call_type) = call.call_type.as_deref() {
            by_type.entry(call_type).or_default().push(call.response);
        }
        if let Some(priority) = call.priority.as_deref() {
            by_priority.entry(priority).or_default().push(call.response);
        }
    }

    let by_district = by_district
        .into_iter()
        .filter_map(|(district, values)| {
            let (median_response, call_count) = median_and_count(&values)?;
            Some(DistrictResponse {
                district,
                median_response,
                call_count,
            })
        })
        .collect();

    let by_type = top_groups(by_type, TOP_TYPES)
        .into_iter()
        .map(|(call_type, median_response, call_count)| TypeResponse {
            call_type,
            median_response,
            call_count,
        })
        .collect();

    let by_priority = top_groups(by_priority, TOP_PRIORITIES)
        .into_iter()
        .map(|(priority, median_response, call_count)| PriorityResponse {
            priority,
            median_response,
            call_count,
        })
        .collect();

    let all: Vec<f64> = calls.iter().map(|c| c.response).collect();
    let emergency: Vec<f64> = calls
        .iter()
        .filter(|c| c.emergency)
        .map(|c| c.response)
        .collect();

    let summary = summarize(&monthly, &all, &emergency);

    ResponseTimes {
        monthly,
        by_district,
        by_type,
        distribution: histogram(all.iter().copied()),
        by_priority,
        summary,
    }
}

fn monthly_rows(calls: &[ValidCall]) -> Vec<MonthlyResponse> {
    let mut months: BTreeMap<Period, MonthGroup> = BTreeMap::new();
    for call in calls {
        let group = months.entry(call.period).or_default();
        group.all.push(call.response);
        if let Some(total) = call.total {
            group.totals.push(total);
        }
        if call.emergency {
            group.emergency.push(call.response);
        } else {
            group.non_emergency.push(call.response);
        }
    }

    months
        .into_iter()
        .filter_map(|(month, group)| {
            let all = SampleStats::of(&group.all)?;
            let emergency = SampleStats::of(&group.emergency);
            let non_emergency = SampleStats::of(&group.non_emergency);
            Some(MonthlyResponse {
                month,
                median_response: all.median,
                mean_response: all.mean,
                p90_response: all.p90,
                call_count: all.count,
                median_total: median_sorted(&sorted(&group.totals)),
                emergency_median: emergency.map(|s| s.median),
                emergency_mean: emergency.map(|s| s.mean),
                emergency_p90: emergency.map(|s| s.p90),
                non_emergency_median: non_emergency.map(|s| s.median),
                non_emergency_mean: non_emergency.map(|s| s.mean),
                non_emergency_p90: non_emergency.map(|s| s.p90),
            })
        })
        .collect()
}

fn median_and_count(values: &[f64]) -> Option<(f64, u64)> {
    let median = median_sorted(&sorted(values))?;
    Some((median, values.len() as u64))
}

/// The `limit` largest groups by count; ties go to the smaller key.
fn top_groups(groups: BTreeMap<&str, Vec<f64>>, limit: usize) -> Vec<(String, f64, u64)> {
    let mut rows: Vec<(String, f64, u64)> = groups
        .into_iter()
        .filter_map(|(key, values)| {
            let (median, count) = median_and_count(&values)?;
            Some((key.to_string(), median, count))
        })
        .collect();
    // BTreeMap order is ascending by key, and the sort is stable.
    rows.sort_by(|a, b| b.2.cmp(&a.2));
    rows.truncate(limit);
    rows
}

fn summarize(monthly: &[MonthlyResponse], all: &[f64], emergency: &[f64]) -> ResponseSummary {
    let latest = monthly.last();
    ResponseSummary {
        total_calls: all.len() as u64,
        overall_median: median_sorted(&sorted(all)).unwrap_or(0.0),
        emergency_median: median_sorted(&sorted(emergency)).unwrap_or(0.0),
        latest_month: latest.map(|m| m.month.to_string()).unwrap_or_default(),
        latest_median: latest.map_or(0.0, |m| m.median_response),
    }
}
