//! rota-ingest - Schedule normalization CLI
//!
//! Runs the normalization pipeline against the configured raw source and
//! prints a JSON summary to stdout. Logs go to stderr (or `[logging].file`).
//!
//! Exit status is non-zero only for fatal errors (unreadable source or alias
//! table, malformed configuration, failed write). Row-level problems are
//! reported in the summary and do not fail the process.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use rota_ingest::config::load_config;
use rota_ingest::logging::{init_tracing, with_bootstrap_subscriber};
use rota_ingest::{IngestService, IngestSettings, RunOptions};

/// Command-line arguments for rota-ingest
#[derive(Parser, Debug)]
#[command(name = "rota-ingest")]
#[command(about = "Normalize the service rota into canonical records and domain views")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long, global = true, env = "ROTA_CONFIG")]
    config: Option<PathBuf>,

    /// Root folder for relative input/output paths
    #[arg(short, long, global = true)]
    root_folder: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the pipeline and write output
    Run {
        /// Transform and validate only; write nothing
        #[arg(long)]
        dry_run: bool,

        /// Run even if the raw dataset is unchanged
        #[arg(long)]
        force: bool,
    },
    /// Fingerprint the raw dataset and report whether a run is needed
    Check {
        #[arg(long)]
        force: bool,
    },
    /// Run the pipeline in preview mode and print the full report
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config warnings go to stderr until [logging] is known
    let config = with_bootstrap_subscriber(std::io::stderr, || {
        load_config(args.config.as_deref())
    })
    .context("Failed to load configuration")?;
    init_tracing(&config.logging).context("Failed to initialize logging")?;

    info!(
        "Starting rota-ingest v{}",
        env!("CARGO_PKG_VERSION")
    );

    let settings = IngestSettings::resolve(&config, args.root_folder.clone())
        .context("Invalid configuration")?;
    settings
        .root()
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;

    let service = IngestService::from_settings(settings);

    let output = match args.command {
        Command::Run { dry_run, force } => {
            let result = service
                .run(RunOptions { dry_run, force })
                .await
                .context("Normalization run failed")?;
            serde_json::to_string_pretty(&result.summary)?
        }
        Command::Check { force } => {
            let result = service.check(force).await.context("Change check failed")?;
            serde_json::to_string_pretty(&result)?
        }
        Command::Validate => {
            let result = service.validate().await.context("Validation run failed")?;
            serde_json::to_string_pretty(&serde_json::json!({
                "summary": result.summary,
                "report": result.report,
            }))?
        }
    };

    println!("{}", output);
    Ok(())
}
