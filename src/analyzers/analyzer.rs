use crate::analyzers::aggregate::aggregate_calls;
use crate::analyzers::types::ResponseTimes;
use crate::extract::call_records::read_call_records;
use crate::output::write_json;
use crate::period::Period;
use anyhow::Result;
use std::path::PathBuf;
use tracing::{info, warn};

/// The call-record aggregation as a self-contained job: one input file,
/// one output file, and a structured result.
#[derive(Debug, Clone)]
pub struct AggregationJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub floor: Period,
}

/// Result of an [`AggregationJob`] run.
#[derive(Debug)]
pub enum JobOutcome {
    /// The artifact was computed and written.
    Written { months: usize, calls: u64 },
    /// The artifact already existed and was left untouched.
    SkippedExisting,
    /// The input file does not exist; nothing was written.
    MissingInput,
    /// Reading or aggregating failed; nothing was written.
    Failed { error: anyhow::Error },
}

impl AggregationJob {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>, floor: Period) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            floor,
        }
    }

    /// Runs the job. The artifact is computed at most once: an existing
    /// output is never recomputed.
    pub fn run(&self) -> JobOutcome {
        if !self.input.exists() {
            return JobOutcome::MissingInput;
        }
        if self.output.exists() {
            info!(path = %self.output.display(), "Aggregate already exists, skipping");
            return JobOutcome::SkippedExisting;
        }

        match self.compute().and_then(|bundle| {
            write_json(&self.output, &bundle)?;
            Ok(bundle)
        }) {
            Ok(bundle) => JobOutcome::Written {
                months: bundle.monthly.len(),
                calls: bundle.summary.total_calls,
            },
            Err(error) => {
                warn!(input = %self.input.display(), error = %error, "Aggregation failed");
                JobOutcome::Failed { error }
            }
        }
    }

    fn compute(&self) -> Result<ResponseTimes> {
        let records = read_call_records(&self.input)?;
        info!(records = records.len(), "Aggregating call records");
        Ok(aggregate_calls(&records, self.floor))
    }
}
