//! Data types of the response-time artifact.

use serde::{Deserialize, Serialize};

use crate::period::Period;

/// Monthly response-time statistics, in minutes.
///
/// Fields that a source cannot provide are `null` rather than absent, so the
/// dashboard always sees the same keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyResponse {
    pub month: Period,
    pub median_response: f64,
    pub mean_response: f64,
    pub p90_response: f64,
    pub call_count: u64,
    /// Median of creation → arrival.
    pub median_total: Option<f64>,
    pub emergency_median: Option<f64>,
    pub emergency_mean: Option<f64>,
    pub emergency_p90: Option<f64>,
    pub non_emergency_median: Option<f64>,
    pub non_emergency_mean: Option<f64>,
    pub non_emergency_p90: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictResponse {
    pub district: i64,
    pub median_response: f64,
    pub call_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeResponse {
    #[serde(rename = "type")]
    pub call_type: String,
    pub median_response: f64,
    pub call_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityResponse {
    pub priority: String,
    pub median_response: f64,
    pub call_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketCount {
    pub bucket: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSummary {
    pub total_calls: u64,
    pub overall_median: f64,
    pub emergency_median: f64,
    /// `YYYY-MM` of the newest month, or empty when there is none.
    pub latest_month: String,
    pub latest_median: f64,
}

/// The complete `response-times.json` artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseTimes {
    pub monthly: Vec<MonthlyResponse>,
    pub by_district: Vec<DistrictResponse>,
    pub by_type: Vec<TypeResponse>,
    pub distribution: Vec<BucketCount>,
    pub by_priority: Vec<PriorityResponse>,
    pub summary: ResponseSummary,
}

impl ResponseTimes {
    /// Empty collections and a zeroed summary, written when aggregation
    /// fails so the dashboard still finds a file to import.
    pub fn placeholder() -> Self {
        Self::default()
    }
}
