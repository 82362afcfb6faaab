//! Delimited text addressed by header names (home listing prices).

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::BTreeMap;
use tracing::debug;

use super::parse_number;
use crate::period::Period;
use crate::records::MonthlyPrices;

/// Header names of the columns to read. Defaults follow the Realtor.com
/// county inventory export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceColumns {
    /// `YYYYMM` month column.
    pub period: String,
    pub median_price: String,
    pub avg_price: String,
}

impl Default for PriceColumns {
    fn default() -> Self {
        Self {
            period: "month_date_yyyymm".to_string(),
            median_price: "median_listing_price".to_string(),
            avg_price: "average_listing_price".to_string(),
        }
    }
}

/// Extracts monthly prices.
///
/// Quoted fields may contain commas. A price that is missing, non-numeric,
/// or not positive becomes `None`; a month with neither price is dropped.
///
/// # Errors
///
/// Returns an error if the header row cannot be read or lacks one of the
/// configured columns. An empty input yields an empty series.
pub fn extract(bytes: &[u8], columns: &PriceColumns, floor: Period) -> Result<Vec<MonthlyPrices>> {
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
    let period_idx = position(&columns.period)?;
    let median_idx = position(&columns.median_price)?;
    let avg_idx = position(&columns.avg_price)?;

    let price = |record: &StringRecord, idx: usize| {
        record
            .get(idx)
            .and_then(parse_number)
            .filter(|value| *value > 0.0)
    };

    let mut by_period: BTreeMap<Period, MonthlyPrices> = BTreeMap::new();
    let mut dropped = 0usize;

    for result in reader.records() {
        let Ok(record) = result else {
            dropped += 1;
            continue;
        };
        let Some(period) = record.get(period_idx).and_then(Period::parse) else {
            dropped += 1;
            continue;
        };
        let median_price = price(&record, median_idx);
        let avg_price = price(&record, avg_idx);
        if period < floor || (median_price.is_none() && avg_price.is_none()) {
            continue;
        }
        by_period.entry(period).or_insert(MonthlyPrices {
            period,
            median_price,
            avg_price,
        });
    }

    debug!(months = by_period.len(), dropped, "Price table extracted");
    Ok(by_period.into_values().collect())
}
