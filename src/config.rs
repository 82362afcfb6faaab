//! Pipeline configuration: where raw files live and where artifacts go.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::period::Period;

/// Earliest month kept in any artifact. Annual series keep `year >= FLOOR.year()`.
pub const FLOOR: Period = Period::from_parts(2015, 1);

/// Artifact file names, read by the dashboard at build time.
pub mod artifacts {
    pub const MURDERS: &str = "murders.json";
    pub const CRIMES: &str = "crimes.json";
    pub const ADDRESSES: &str = "addresses.json";
    pub const UNEMPLOYMENT: &str = "unemployment.json";
    pub const HOME_PRICES: &str = "home-prices.json";
    pub const HOUSEHOLD_INCOME: &str = "household-income.json";
    pub const POPULATION: &str = "population.json";
    pub const RESPONSE_TIMES: &str = "response-times.json";
    pub const SNAPSHOT_311: &str = "311-snapshot.json";
}

/// Raw input file names, relative to the project root.
///
/// Can be overridden from a JSON file; missing keys keep their defaults:
/// ```json
/// { "murders": "exports/murders-2025.xlsx" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceFiles {
    pub murders: String,
    pub crimes: String,
    pub addresses: String,
    pub unemployment: String,
    pub home_prices: String,
    pub household_income: String,
    pub population: String,
    pub call_records: String,
    pub daily_response: String,
}

impl Default for SourceFiles {
    fn default() -> Self {
        Self {
            murders: "NOLA Murders by Month.xlsx".to_string(),
            crimes: "NOLA Crimes by Month.xlsx".to_string(),
            addresses: "TheDataCenter_ActiveResidentialAddresses.xlsx".to_string(),
            unemployment: "unemployment rate.csv".to_string(),
            home_prices: "home_prices.csv".to_string(),
            household_income: "median_household_income.csv".to_string(),
            population: "population.csv".to_string(),
            call_records: "Call_For_Service_Response_Time.parquet".to_string(),
            daily_response: "response_times_daily.csv".to_string(),
        }
    }
}

impl SourceFiles {
    /// Loads overrides from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read source table {}", path.display()))?;
        let sources = serde_json::from_str(&content)
            .with_context(|| format!("invalid source table {}", path.display()))?;
        Ok(sources)
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub root_dir: PathBuf,
    pub data_dir: PathBuf,
    pub sources: SourceFiles,
}

impl PipelineConfig {
    pub fn new(root_dir: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            data_dir: data_dir.into(),
            sources: SourceFiles::default(),
        }
    }

    pub fn with_sources(mut self, sources: SourceFiles) -> Self {
        self.sources = sources;
        self
    }

    pub fn source_path(&self, file_name: &str) -> PathBuf {
        self.root_dir.join(file_name)
    }

    /// A relative data directory is resolved against the root.
    pub fn artifact_path(&self, artifact: &str) -> PathBuf {
        self.root_dir.join(&self.data_dir).join(artifact)
    }
}
