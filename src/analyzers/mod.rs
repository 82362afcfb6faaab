//! Response-time analytics.
//!
//! Validates individual calls for service, groups them by month and by
//! district, call type and priority, and computes median, mean, 90th
//! percentile and a fixed-bucket histogram. A pre-aggregated daily CSV can
//! stand in for the call records when only that is available.

pub mod aggregate;
pub mod analyzer;
pub mod daily;
pub mod distribution;
pub mod types;
pub mod utility;
