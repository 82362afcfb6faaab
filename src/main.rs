//! CLI entry point for the civic data conversion pipeline.
//!
//! Without a subcommand, converts every raw source file into its dashboard
//! JSON artifact. `snapshot-311` captures live 311 pothole metrics.

mod infra;

use crate::infra::socrata::SocrataClient;
use anyhow::{Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use civic_etl::config::{PipelineConfig, SourceFiles, artifacts};
use civic_etl::fetch::{AppToken, BasicClient};
use civic_etl::output::write_json;
use civic_etl::pipeline::Pipeline;
use civic_etl::services::potholes::snapshot;
use civic_etl::services::soql::NOLA_311_ENDPOINT;
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "civic_etl")]
#[command(about = "Convert raw civic data files into dashboard JSON artifacts", long_about = None)]
struct Cli {
    /// Directory holding the raw source files
    #[arg(long, env = "CIVIC_ROOT_DIR", default_value = ".")]
    root: PathBuf,

    /// Directory the JSON artifacts are written to, relative to the root
    #[arg(long, env = "CIVIC_DATA_DIR", default_value = "src/data")]
    data_dir: PathBuf,

    /// JSON file overriding source file names
    #[arg(long, value_name = "FILE")]
    sources: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert every raw source file (the default)
    Convert,
    /// Fetch live 311 pothole metrics and write them as JSON
    #[command(name = "snapshot-311")]
    Snapshot311 {
        /// Output file (defaults to 311-snapshot.json in the data directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Start of the year-to-date window (defaults to Jan 1 of this year)
        #[arg(long, value_name = "YYYY-MM-DD")]
        since: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _file_guard = init_logging();

    let cli = Cli::parse();

    let sources = match &cli.sources {
        Some(path) => SourceFiles::load(path)?,
        None => SourceFiles::default(),
    };
    let config = PipelineConfig::new(&cli.root, &cli.data_dir).with_sources(sources);

    match cli.command.unwrap_or(Commands::Convert) {
        Commands::Convert => {
            Pipeline::new(config).run();
        }
        Commands::Snapshot311 { output, since } => {
            let output = output.unwrap_or_else(|| config.artifact_path(artifacts::SNAPSHOT_311));
            snapshot_311(&output, since).await?;
        }
    }

    Ok(())
}

/// Human-readable progress on stdout plus a JSON rolling log file.
fn init_logging() -> WorkerGuard {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/civic_etl.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("civic_etl.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stdout_layer = fmt::layer()
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stdout)
        .with_filter(EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| EnvFilter::new("info")));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(
            EnvFilter::try_from_env("RUST_LOG_JSON").unwrap_or_else(|_| EnvFilter::new("debug")),
        );

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(json_layer)
        .init();

    file_guard
}

/// Queries the 311 dataset and writes the pothole snapshot to `output`.
#[tracing::instrument(skip(output), fields(output = %output.display()))]
async fn snapshot_311(output: &Path, since: Option<NaiveDate>) -> Result<()> {
    let since = match since {
        Some(date) => date,
        None => {
            let today = Local::now().date_naive();
            NaiveDate::from_ymd_opt(today.year(), 1, 1).context("invalid start of year")?
        }
    };

    let token = std::env::var("SOCRATA_APP_TOKEN").ok();
    let http = AppToken::new(BasicClient::new()?, token);
    if !http.has_token() {
        warn!("SOCRATA_APP_TOKEN not set, requests may be throttled");
    }
    let api = SocrataClient::new(http, NOLA_311_ENDPOINT)?;

    let snap = snapshot(&api, since).await;
    write_json(output, &snap)?;

    info!(since = %since, "311 snapshot written");
    Ok(())
}
