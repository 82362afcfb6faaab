//! Date and period normalization.
//!
//! Raw sources disagree on how they write dates: Excel serial numbers,
//! `MM/DD/YYYY hh:mm:ss AM` timestamps, `YYYYMM` integers, ISO strings, or a
//! year header paired with a month name. Everything collapses into a
//! [`Period`] (calendar month) or a bare year.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A calendar month, rendered as `YYYY-MM`.
///
/// Field order makes the derived ordering chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    month: u32,
}

/// Month-name lookup. Both short and long spellings appear in the source
/// spreadsheets (`Jun` and `June` side by side).
static MONTH_NAMES: &[(&str, u32)] = &[
    ("jan", 1),
    ("january", 1),
    ("feb", 2),
    ("february", 2),
    ("mar", 3),
    ("march", 3),
    ("apr", 4),
    ("april", 4),
    ("may", 5),
    ("jun", 6),
    ("june", 6),
    ("jul", 7),
    ("july", 7),
    ("aug", 8),
    ("august", 8),
    ("sep", 9),
    ("sept", 9),
    ("september", 9),
    ("oct", 10),
    ("october", 10),
    ("nov", 11),
    ("november", 11),
    ("dec", 12),
    ("december", 12),
];

const TIMESTAMP_FORMATS: &[&str] = &[
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
];

impl Period {
    /// Builds a period without validation. Only for literals known to be valid.
    pub(crate) const fn from_parts(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// Returns `None` unless the year has four digits and the month is 1–12.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1000..=9999).contains(&year) && (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn from_date(date: NaiveDate) -> Option<Self> {
        Self::new(date.year(), date.month())
    }

    /// Splits a six-digit `YYYYMM` integer, e.g. `202503` → `2025-03`.
    pub fn from_yyyymm(value: i64) -> Option<Self> {
        if !(100_000..=999_999).contains(&value) {
            return None;
        }
        let year = i32::try_from(value / 100).ok()?;
        let month = u32::try_from(value % 100).ok()?;
        Self::new(year, month)
    }

    /// Combines a year header with a month-name header cell.
    pub fn from_year_and_month_name(year: i32, month_name: &str) -> Option<Self> {
        Self::new(year, month_number(month_name)?)
    }

    pub fn from_excel_serial(serial: f64) -> Option<Self> {
        Self::from_date(excel_serial_to_datetime(serial)?.date())
    }

    /// Parses any of the string shapes the raw sources use.
    ///
    /// - `MM/DD/YYYY` with an optional time suffix
    /// - six digits `YYYYMM`
    /// - ISO-like strings, truncated to their first ten characters
    /// - a bare `YYYY-MM`
    pub fn parse(raw: &str) -> Option<Self> {
        let s = raw.trim();
        if s.is_empty() {
            return None;
        }
        if s.contains('/') {
            return Self::from_date(parse_slash_date(s)?);
        }
        if s.len() == 6 && s.bytes().all(|b| b.is_ascii_digit()) {
            return Self::from_yyyymm(s.parse().ok()?);
        }
        let head = s.get(..10).unwrap_or(s);
        if let Ok(date) = NaiveDate::parse_from_str(head, "%Y-%m-%d") {
            return Self::from_date(date);
        }
        s.parse().ok()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Strict `YYYY-MM` parsing, the canonical rendering.
impl FromStr for Period {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| anyhow::anyhow!("period '{s}' is not YYYY-MM"))?;
        if year.len() != 4 || month.len() != 2 {
            anyhow::bail!("period '{s}' is not YYYY-MM");
        }
        Self::new(year.parse()?, month.parse()?)
            .ok_or_else(|| anyhow::anyhow!("period '{s}' is out of range"))
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Maps `Jan`, `June`, `sept`, ... to a month number. Case-insensitive.
pub fn month_number(name: &str) -> Option<u32> {
    let needle = name.trim().to_ascii_lowercase();
    MONTH_NAMES
        .iter()
        .find(|(candidate, _)| *candidate == needle)
        .map(|(_, month)| *month)
}

/// Reads the leading four-digit year of strings like `2019-01-01` or `2019`.
pub fn parse_year(raw: &str) -> Option<i32> {
    let head = raw.trim().get(..4)?;
    if !head.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    head.parse().ok()
}

/// Parses the date part of `MM/DD/YYYY[ HH:MM:SS AM]`.
pub fn parse_slash_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.split_whitespace().next()?;
    NaiveDate::parse_from_str(date_part, "%m/%d/%Y").ok()
}

/// Parses a full call-record timestamp. Date-only values land on midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Some(parsed) = TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
    {
        return Some(parsed);
    }
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(s) {
        return Some(with_offset.naive_local());
    }
    if s.contains('/') {
        return parse_slash_date(s)?.and_hms_opt(0, 0, 0);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?.and_hms_opt(0, 0, 0)
}

/// Serial of 9999-12-31, the last date Excel can represent.
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Converts an Excel serial date (days since 1899-12-30) to a timestamp.
/// Serials outside Excel's date range yield `None`.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(1.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let days = Duration::try_days(serial.trunc() as i64)?;
    let seconds = Duration::try_seconds((serial.fract() * 86_400.0).round() as i64)?;
    epoch.checked_add_signed(days + seconds)
}
