//! eventgoods: monthly promotional-data batch orchestrator.
//!
//! Main binary with subcommands:
//! - `daemon`: register the monthly job and run the scheduler until ctrl-c
//! - `run`: invoke the batch pipeline once, directly

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod daemon;

#[derive(Parser)]
#[command(name = "eventgoods")]
#[command(about = "Monthly promotional-data batch orchestrator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduler daemon until interrupted
    Daemon {
        /// Day of month to fire on (1-31)
        #[arg(long, env = "EVENTGOODS_DAY", default_value = "28")]
        day: u32,

        /// Hour to fire at (0-23)
        #[arg(long, env = "EVENTGOODS_HOUR", default_value = "9")]
        hour: u32,

        /// Minute to fire at (0-59)
        #[arg(long, env = "EVENTGOODS_MINUTE", default_value = "30")]
        minute: u32,

        /// Id of the monthly batch trigger
        #[arg(long, env = "EVENTGOODS_JOB_ID", default_value = "next-month-products")]
        job_id: String,

        /// Directory scrape artifacts are written to
        #[arg(long, env = "EVENTGOODS_DATA_DIR", default_value = "data")]
        data_dir: PathBuf,

        /// Root directory for per-run audit logs
        #[arg(long, env = "EVENTGOODS_LOG_DIR", default_value = "batch_log")]
        log_dir: PathBuf,

        /// Whole-pipeline retries after the first attempt
        #[arg(long, default_value = "3")]
        max_retries: u32,

        /// Delay between retry attempts in seconds
        #[arg(long, default_value = "5")]
        retry_delay_secs: u64,
    },

    /// Run the batch pipeline once and exit
    Run {
        /// Target year (defaults to the next period of now)
        #[arg(long, requires = "month")]
        year: Option<i32>,

        /// Target month, 1-12 (defaults to the next period of now)
        #[arg(long, requires = "year")]
        month: Option<u32>,

        /// Skip scrape steps; still writes audit markers and runs
        /// post-processing, validating the wiring end to end
        #[arg(long)]
        dry_run: bool,

        /// Directory scrape artifacts are written to
        #[arg(long, env = "EVENTGOODS_DATA_DIR", default_value = "data")]
        data_dir: PathBuf,

        /// Root directory for per-run audit logs
        #[arg(long, env = "EVENTGOODS_LOG_DIR", default_value = "batch_log")]
        log_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Daemon {
            day,
            hour,
            minute,
            job_id,
            data_dir,
            log_dir,
            max_retries,
            retry_delay_secs,
        } => {
            daemon::run(daemon::DaemonConfig {
                day,
                hour,
                minute,
                job_id,
                data_dir,
                log_dir,
                max_retries,
                retry_delay: Duration::from_secs(retry_delay_secs),
            })
            .await
        }

        Commands::Run {
            year,
            month,
            dry_run,
            data_dir,
            log_dir,
        } => daemon::run_once(year, month, dry_run, data_dir, log_dir).await,
    }
}
