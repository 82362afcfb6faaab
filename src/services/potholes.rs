//! Snapshot of 311 pothole activity from the city's open-data portal.
//!
//! Runs the same set of SoQL aggregations the dashboard's 311 page shows and
//! reduces them into one serializable document. Each query degrades on its
//! own: a failed query is logged and its section keeps its default value.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::period::Period;
use crate::services::soql::{OpenDataApi, SoqlQuery, count_field, number_field, text_field};

const POTHOLE_FILTER: &str = "request_type='Roads and Streets' AND request_reason='Pothole'";
/// `request_type` value highlighted as pothole work.
pub const POTHOLE_REQUEST_TYPE: &str = "Roads and Streets";
const OPEN_STATUS: &str = "Pending";
pub const TOP_REQUEST_TYPES: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthCount {
    pub month: Period,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistrictCount {
    /// Display label, e.g. `District B`.
    pub district: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestTypeRow {
    #[serde(rename = "type")]
    pub request_type: String,
    pub total: u64,
    pub open: u64,
    /// Percentage of open requests, one decimal.
    pub open_percent: f64,
    pub is_pothole: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PotholeSnapshot {
    /// First day of the year-to-date window.
    pub since: Option<NaiveDate>,
    pub open_potholes: u64,
    #[serde(rename = "totalPotholesYTD")]
    pub total_potholes_ytd: u64,
    pub avg_days_to_close: f64,
    pub open_percent: f64,
    pub monthly_trend: Vec<MonthCount>,
    pub status_breakdown: Vec<StatusCount>,
    pub by_district: Vec<DistrictCount>,
    pub top_request_types: Vec<RequestTypeRow>,
}

/// Jan 1 of the year before `since`; the monthly trend spans two years.
fn trend_start(since: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(since.year() - 1, 1, 1).unwrap_or(since)
}

fn open_count_query() -> SoqlQuery {
    SoqlQuery::select("count(*) as total")
        .filter(format!("{POTHOLE_FILTER} AND request_status='{OPEN_STATUS}'"))
}

fn total_count_query(since: NaiveDate) -> SoqlQuery {
    SoqlQuery::select("count(*) as total")
        .filter(format!("{POTHOLE_FILTER} AND date_created>='{since}'"))
}

fn days_to_close_query(since: NaiveDate) -> SoqlQuery {
    SoqlQuery::select("avg(date_diff_d(case_close_date,date_created)) as avg_days").filter(format!(
        "{POTHOLE_FILTER} AND request_status='Closed' AND case_close_date>='{since}'"
    ))
}

fn monthly_trend_query(since: NaiveDate) -> SoqlQuery {
    SoqlQuery::select("date_trunc_ym(date_created) as month,count(*) as total")
        .filter(format!(
            "{POTHOLE_FILTER} AND date_created>='{}'",
            trend_start(since)
        ))
        .group_by("month")
        .order_by("month")
}

fn status_query(since: NaiveDate) -> SoqlQuery {
    SoqlQuery::select("request_status,count(*) as total")
        .filter(format!("{POTHOLE_FILTER} AND date_created>='{since}'"))
        .group_by("request_status")
}

fn district_query(since: NaiveDate) -> SoqlQuery {
    SoqlQuery::select("address_councildis,count(*) as total")
        .filter(format!(
            "{POTHOLE_FILTER} AND date_created>='{since}' AND address_councildis IS NOT NULL"
        ))
        .group_by("address_councildis")
        .order_by("total DESC")
}

fn request_types_query(since: NaiveDate) -> SoqlQuery {
    SoqlQuery::select("request_type,request_status,count(*) as total")
        .filter(format!("date_created>='{since}'"))
        .group_by("request_type,request_status")
        .order_by("total DESC")
        .limit(100)
}

/// Runs every query concurrently and assembles the snapshot.
pub async fn snapshot<A: OpenDataApi + ?Sized>(api: &A, since: NaiveDate) -> PotholeSnapshot {
    let queries = [
        ("open_potholes", open_count_query()),
        ("total_potholes", total_count_query(since)),
        ("days_to_close", days_to_close_query(since)),
        ("monthly_trend", monthly_trend_query(since)),
        ("status_breakdown", status_query(since)),
        ("by_district", district_query(since)),
        ("request_types", request_types_query(since)),
    ];
    let [open, total, days, trend, status, districts, types] = queries.map(|(name, query)| {
        async move {
            match api.query(&query).await {
                Ok(rows) => rows,
                Err(err) => {
                    warn!(query = name, error = %format!("{err:#}"), "311 query failed");
                    Vec::new()
                }
            }
        }
    });
    let (open, total, days, trend, status, districts, types) =
        tokio::join!(open, total, days, trend, status, districts, types);

    let open_potholes = first_count(&open);
    let total_potholes_ytd = first_count(&total);
    let snapshot = PotholeSnapshot {
        since: Some(since),
        open_potholes,
        total_potholes_ytd,
        avg_days_to_close: days
            .first()
            .and_then(|row| number_field(row, "avg_days"))
            .unwrap_or(0.0),
        open_percent: percent(open_potholes, total_potholes_ytd),
        monthly_trend: monthly_trend(&trend),
        status_breakdown: status_breakdown(&status),
        by_district: by_district(&districts),
        top_request_types: top_request_types(&types),
    };

    info!(
        open = snapshot.open_potholes,
        ytd = snapshot.total_potholes_ytd,
        "311 snapshot assembled"
    );
    snapshot
}

fn first_count(rows: &[Value]) -> u64 {
    rows.first().map_or(0, |row| count_field(row, "total"))
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

fn one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn monthly_trend(rows: &[Value]) -> Vec<MonthCount> {
    rows.iter()
        .filter_map(|row| {
            let month = Period::parse(&text_field(row, "month")?)?;
            Some(MonthCount {
                month,
                count: count_field(row, "total"),
            })
        })
        .collect()
}

pub fn status_breakdown(rows: &[Value]) -> Vec<StatusCount> {
    rows.iter()
        .filter_map(|row| {
            Some(StatusCount {
                status: text_field(row, "request_status")?,
                count: count_field(row, "total"),
            })
        })
        .collect()
}

pub fn by_district(rows: &[Value]) -> Vec<DistrictCount> {
    rows.iter()
        .filter_map(|row| {
            let district = text_field(row, "address_councildis")?;
            Some(DistrictCount {
                district: format!("District {district}"),
                count: count_field(row, "total"),
            })
        })
        .collect()
}

/// Folds `(type, status, total)` rows into per-type totals and keeps the
/// largest [`TOP_REQUEST_TYPES`]; ties go to the smaller name.
pub fn top_request_types(rows: &[Value]) -> Vec<RequestTypeRow> {
    let mut by_type: BTreeMap<String, (u64, u64)> = BTreeMap::new();
    for row in rows {
        let Some(request_type) = text_field(row, "request_type") else {
            continue;
        };
        let count = count_field(row, "total");
        let entry = by_type.entry(request_type).or_default();
        entry.0 += count;
        if text_field(row, "request_status").as_deref() == Some(OPEN_STATUS) {
            entry.1 += count;
        }
    }

    let mut types: Vec<RequestTypeRow> = by_type
        .into_iter()
        .map(|(request_type, (total, open))| RequestTypeRow {
            is_pothole: request_type == POTHOLE_REQUEST_TYPE,
            request_type,
            total,
            open,
            open_percent: one_decimal(percent(open, total)),
        })
        .collect();
    types.sort_by(|a, b| b.total.cmp(&a.total));
    types.truncate(TOP_REQUEST_TYPES);
    types
}
