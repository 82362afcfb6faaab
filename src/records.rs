//! Normalized series produced by the extractors, and the artifact rows the
//! dashboard reads.
//!
//! Extractors speak in generic terms (`period`, `count`, `value`); each
//! artifact renames those to the keys its page expects.

use serde::{Deserialize, Serialize};

use crate::period::Period;

/// One month of a non-negative count (murders, crimes, active addresses).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthlyCount {
    pub period: Period,
    pub count: u64,
}

/// One month of a scalar value (unemployment rate).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyValue {
    pub period: Period,
    pub value: f64,
}

/// One month of listing prices. At least one price is present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyPrices {
    pub period: Period,
    pub median_price: Option<f64>,
    pub avg_price: Option<f64>,
}

/// One year of a scalar value (income, population).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnualValue {
    pub year: i32,
    pub value: f64,
}

/// `murders.json` rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentMonth {
    pub month: Period,
    pub murders: u64,
}

/// `crimes.json` rows. The crime page reads the count under `murders` for
/// most charts and under `crimes` for the current-year comparison, so both
/// keys carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrimeMonth {
    pub month: Period,
    pub murders: u64,
    pub crimes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressMonth {
    pub month: Period,
    pub addresses: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateMonth {
    pub month: Period,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceMonth {
    pub month: Period,
    pub median_price: Option<f64>,
    pub avg_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeYear {
    pub year: i32,
    pub income: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationYear {
    pub year: i32,
    pub population: i64,
}

impl From<MonthlyCount> for IncidentMonth {
    fn from(point: MonthlyCount) -> Self {
        Self {
            month: point.period,
            murders: point.count,
        }
    }
}

impl From<MonthlyCount> for CrimeMonth {
    fn from(point: MonthlyCount) -> Self {
        Self {
            month: point.period,
            murders: point.count,
            crimes: point.count,
        }
    }
}

impl From<MonthlyCount> for AddressMonth {
    fn from(point: MonthlyCount) -> Self {
        Self {
            month: point.period,
            addresses: point.count,
        }
    }
}

impl From<MonthlyValue> for RateMonth {
    fn from(point: MonthlyValue) -> Self {
        Self {
            month: point.period,
            rate: point.value,
        }
    }
}

impl From<MonthlyPrices> for PriceMonth {
    fn from(point: MonthlyPrices) -> Self {
        Self {
            month: point.period,
            median_price: point.median_price,
            avg_price: point.avg_price,
        }
    }
}

impl From<AnnualValue> for IncomeYear {
    fn from(point: AnnualValue) -> Self {
        Self {
            year: point.year,
            income: point.value.round() as i64,
        }
    }
}

impl From<AnnualValue> for PopulationYear {
    fn from(point: AnnualValue) -> Self {
        Self {
            year: point.year,
            population: point.value.round() as i64,
        }
    }
}
