//! Sequential job runner.
//!
//! Every job reads one raw file, extracts normalized rows and writes one
//! artifact. Jobs are independent: a missing input or a failure is recorded
//! in the job's report and the run moves on to the next job.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use std::fs;
use tracing::{error, info, warn};

use crate::analyzers::analyzer::{AggregationJob, JobOutcome};
use crate::analyzers::daily::{DailyColumns, read_daily, roll_up};
use crate::analyzers::types::ResponseTimes;
use crate::config::{FLOOR, PipelineConfig, artifacts};
use crate::extract::date_keyed::{self, DateKeyedLayout};
use crate::extract::named::{self, PriceColumns};
use crate::extract::pivoted::{self, PivotLayout};
use crate::extract::positional::{FieldLayout, extract_annual, extract_monthly};
use crate::extract::read_first_sheet;
use crate::output::write_json;
use crate::records::{
    AddressMonth, CrimeMonth, IncidentMonth, IncomeYear, MonthlyCount, PopulationYear, PriceMonth,
    RateMonth,
};

/// Population is published in thousands.
const POPULATION_SCALE: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    Murders,
    Crimes,
    Addresses,
    Unemployment,
    HomePrices,
    HouseholdIncome,
    Population,
    ResponseTimes,
}

impl Job {
    /// Every job, in run order.
    pub const ALL: [Job; 8] = [
        Job::Murders,
        Job::Crimes,
        Job::Addresses,
        Job::Unemployment,
        Job::HomePrices,
        Job::HouseholdIncome,
        Job::Population,
        Job::ResponseTimes,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Job::Murders => "murders",
            Job::Crimes => "crimes",
            Job::Addresses => "addresses",
            Job::Unemployment => "unemployment",
            Job::HomePrices => "home-prices",
            Job::HouseholdIncome => "household-income",
            Job::Population => "population",
            Job::ResponseTimes => "response-times",
        }
    }

    pub fn artifact(&self) -> &'static str {
        match self {
            Job::Murders => artifacts::MURDERS,
            Job::Crimes => artifacts::CRIMES,
            Job::Addresses => artifacts::ADDRESSES,
            Job::Unemployment => artifacts::UNEMPLOYMENT,
            Job::HomePrices => artifacts::HOME_PRICES,
            Job::HouseholdIncome => artifacts::HOUSEHOLD_INCOME,
            Job::Population => artifacts::POPULATION,
            Job::ResponseTimes => artifacts::RESPONSE_TIMES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// The artifact was written with this many top-level records.
    Written { records: usize },
    /// The raw input is absent; no artifact was written.
    MissingInput,
    /// The artifact exists and is computed at most once.
    SkippedExisting,
    /// The job failed; no artifact was written.
    Failed { reason: String },
    /// Aggregation failed and an empty bundle was written in its place.
    Placeholder { reason: String },
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Written { records } => write!(f, "written ({records} records)"),
            JobStatus::MissingInput => write!(f, "input not found"),
            JobStatus::SkippedExisting => write!(f, "already exists, skipped"),
            JobStatus::Failed { reason } => write!(f, "failed: {reason}"),
            JobStatus::Placeholder { reason } => write!(f, "placeholder written: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub job: Job,
    pub status: JobStatus,
}

pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Runs every job in order and logs a summary line per job.
    pub fn run(&self) -> Vec<JobReport> {
        info!(
            root = %self.config.root_dir.display(),
            data_dir = %self.config.data_dir.display(),
            "Converting data files"
        );

        let reports: Vec<JobReport> = Job::ALL
            .iter()
            .map(|&job| JobReport {
                job,
                status: self.run_job(job),
            })
            .collect();

        for report in &reports {
            info!(job = report.job.name(), status = %report.status, "Job finished");
        }
        info!(jobs = reports.len(), "Data conversion complete");
        reports
    }

    #[tracing::instrument(skip(self, job), fields(job = job.name()))]
    pub fn run_job(&self, job: Job) -> JobStatus {
        let sources = &self.config.sources;
        match job {
            Job::Murders => self.incidents::<IncidentMonth>(job, &sources.murders, "Murders"),
            Job::Crimes => self.incidents::<CrimeMonth>(job, &sources.crimes, "Crimes"),
            Job::Addresses => self.emit_series(job, &sources.addresses, |bytes| {
                let sheet = read_first_sheet(bytes)?;
                Ok(pivoted::extract(&sheet, &PivotLayout::default(), FLOOR)
                    .into_iter()
                    .map(AddressMonth::from)
                    .collect::<Vec<_>>())
            }),
            Job::Unemployment => self.emit_series(job, &sources.unemployment, |bytes| {
                let rows = extract_monthly(bytes, &FieldLayout::default(), FLOOR)?;
                Ok(rows.into_iter().map(RateMonth::from).collect::<Vec<_>>())
            }),
            Job::HomePrices => self.emit_series(job, &sources.home_prices, |bytes| {
                let rows = named::extract(bytes, &PriceColumns::default(), FLOOR)?;
                Ok(rows.into_iter().map(PriceMonth::from).collect::<Vec<_>>())
            }),
            Job::HouseholdIncome => self.emit_series(job, &sources.household_income, |bytes| {
                let rows = extract_annual(bytes, &FieldLayout::default(), FLOOR)?;
                Ok(rows.into_iter().map(IncomeYear::from).collect::<Vec<_>>())
            }),
            Job::Population => self.emit_series(job, &sources.population, |bytes| {
                let rows = extract_annual(bytes, &FieldLayout::scaled(POPULATION_SCALE), FLOOR)?;
                Ok(rows.into_iter().map(PopulationYear::from).collect::<Vec<_>>())
            }),
            Job::ResponseTimes => self.response_times(),
        }
    }

    fn incidents<R>(&self, job: Job, source: &str, value_column: &str) -> JobStatus
    where
        R: Serialize + From<MonthlyCount>,
    {
        let layout = DateKeyedLayout::new("Month", value_column);
        self.emit_series(job, source, |bytes| {
            let sheet = read_first_sheet(bytes)?;
            Ok(date_keyed::extract(&sheet, &layout, FLOOR)
                .into_iter()
                .map(R::from)
                .collect::<Vec<_>>())
        })
    }

    fn emit_series<T: Serialize>(
        &self,
        job: Job,
        source: &str,
        build: impl FnOnce(&[u8]) -> Result<Vec<T>>,
    ) -> JobStatus {
        self.emit(job, source, |bytes| {
            let rows = build(bytes)?;
            let count = rows.len();
            Ok((rows, count))
        })
    }

    /// Reads `source`, builds the artifact and writes it. `build` returns the
    /// artifact together with its record count.
    fn emit<T: Serialize>(
        &self,
        job: Job,
        source: &str,
        build: impl FnOnce(&[u8]) -> Result<(T, usize)>,
    ) -> JobStatus {
        let input = self.config.source_path(source);
        if !input.exists() {
            warn!(path = %input.display(), "Source file not found");
            return JobStatus::MissingInput;
        }

        let output = self.config.artifact_path(job.artifact());
        let result = fs::read(&input)
            .with_context(|| format!("failed to read {}", input.display()))
            .and_then(|bytes| build(&bytes))
            .and_then(|(artifact, records)| {
                write_json(&output, &artifact)?;
                Ok(records)
            });

        match result {
            Ok(records) => {
                info!(records, path = %output.display(), "Processed {} records", records);
                JobStatus::Written { records }
            }
            Err(err) => {
                error!(path = %input.display(), error = %format!("{err:#}"), "Job failed");
                JobStatus::Failed {
                    reason: format!("{err:#}"),
                }
            }
        }
    }

    /// Call records when present, otherwise the daily roll-up.
    fn response_times(&self) -> JobStatus {
        let sources = &self.config.sources;
        let output = self.config.artifact_path(artifacts::RESPONSE_TIMES);
        let aggregation =
            AggregationJob::new(self.config.source_path(&sources.call_records), &output, FLOOR);

        match aggregation.run() {
            JobOutcome::Written { months, calls } => {
                info!(months, calls, path = %output.display(), "Response times aggregated");
                JobStatus::Written { records: months }
            }
            JobOutcome::SkippedExisting => JobStatus::SkippedExisting,
            JobOutcome::Failed { error } => {
                let reason = format!("{error:#}");
                match write_json(&output, &ResponseTimes::placeholder()) {
                    Ok(()) => {
                        warn!(path = %output.display(), "Wrote placeholder response times");
                        JobStatus::Placeholder { reason }
                    }
                    Err(err) => {
                        error!(error = %format!("{err:#}"), "Failed to write placeholder");
                        JobStatus::Failed { reason }
                    }
                }
            }
            JobOutcome::MissingInput => {
                info!("Call records not found, trying daily response file");
                self.emit(Job::ResponseTimes, &sources.daily_response, |bytes| {
                    let rows = read_daily(bytes, &DailyColumns::default(), FLOOR)?;
                    let bundle = roll_up(&rows);
                    let months = bundle.monthly.len();
                    Ok((bundle, months))
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_table() {
        assert_eq!(Job::ALL.len(), 8);
        assert_eq!(Job::HomePrices.artifact(), "home-prices.json");
        assert_eq!(Job::ResponseTimes.name(), "response-times");
        assert_eq!(Job::ALL.last(), Some(&Job::ResponseTimes));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(
            JobStatus::Written { records: 3 }.to_string(),
            "written (3 records)"
        );
        assert_eq!(JobStatus::MissingInput.to_string(), "input not found");
    }

    #[test]
    fn test_missing_inputs_are_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(PipelineConfig::new(dir.path(), "out"));

        let reports = pipeline.run();

        assert_eq!(reports.len(), Job::ALL.len());
        assert!(reports.iter().all(|r| r.status == JobStatus::MissingInput));
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_unreadable_workbook_fails_only_its_job() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("NOLA Murders by Month.xlsx"), b"not a workbook").unwrap();
        fs::write(dir.path().join("unemployment rate.csv"), "DATE,RATE\n2016-01-01,5.0\n").unwrap();
        let pipeline = Pipeline::new(PipelineConfig::new(dir.path(), "out"));

        assert!(matches!(
            pipeline.run_job(Job::Murders),
            JobStatus::Failed { .. }
        ));
        assert_eq!(
            pipeline.run_job(Job::Unemployment),
            JobStatus::Written { records: 1 }
        );
        assert!(!dir.path().join("out/murders.json").exists());
    }
}
