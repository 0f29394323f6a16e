//! Daemon wiring: batch runner, retry policy, and scheduler lifecycle.
//!
//! The pipeline is assembled here, explicitly, at startup: scrape sources
//! implement `StepProvider` in their own crates and are registered by this
//! entry point; the clean/merge pass is the built-in post-processing stage.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use miette::{IntoDiagnostic, Result};
use tracing::info;

use eventgoods_batch::{BatchRunner, Period, RetryPolicy, RunInstant, default_offset};
use eventgoods_cleaner::{CleanMergeStep, CleanerConfig};
use eventgoods_scheduler::{Firing, FiringExecutor, JobDefinition, Scheduler};

/// Configuration for the daemon.
pub struct DaemonConfig {
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub job_id: String,
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

/// Register the monthly job and run the scheduler until ctrl-c.
pub async fn run(config: DaemonConfig) -> Result<()> {
    let runner = Arc::new(build_runner(&config.data_dir, &config.log_dir));
    let policy = RetryPolicy::new(config.max_retries, config.retry_delay);

    let scheduler = Scheduler::new(default_offset());
    let def = JobDefinition::new(
        config.job_id.clone(),
        config.day,
        config.hour,
        config.minute,
    )
    .into_diagnostic()?;
    scheduler.add_job(def).await.into_diagnostic()?;

    scheduler.start(batch_executor(runner, policy)).await;

    let info = scheduler.get_info().await;
    for job in &info.jobs {
        info!(
            id = %job.id,
            next_fire = job.next_fire_time.as_deref().unwrap_or("N/A"),
            "schedule active"
        );
    }

    tokio::signal::ctrl_c().await.into_diagnostic()?;
    info!("interrupt received, stopping scheduler");
    scheduler.stop().await;
    Ok(())
}

/// Direct invocation of the batch pipeline, scheduler-free.
pub async fn run_once(
    year: Option<i32>,
    month: Option<u32>,
    dry_run: bool,
    data_dir: PathBuf,
    log_dir: PathBuf,
) -> Result<()> {
    let run_time = RunInstant::now();
    let target = match (year, month) {
        (Some(year), Some(month)) => Period::new(year, month).into_diagnostic()?,
        _ => run_time.next_period(),
    };

    let runner = build_runner(&data_dir, &log_dir);
    let outcomes = runner
        .run(target, dry_run, run_time)
        .await
        .into_diagnostic()?;

    let failed = outcomes.iter().filter(|o| !o.is_success()).count();
    info!(total = outcomes.len(), failed, "batch run finished");
    Ok(())
}

/// Wrap the batch unit of work in the retry policy for scheduler firings.
///
/// Step failures are absorbed inside the pipeline; only a fault escaping
/// the whole run reaches the policy, and only exhaustion surfaces to the
/// scheduler, which logs it and keeps the job registered.
fn batch_executor(runner: Arc<BatchRunner>, policy: RetryPolicy) -> FiringExecutor {
    Arc::new(move |firing: Firing| {
        let runner = runner.clone();
        Box::pin(async move {
            let run_time = RunInstant::new(firing.fired_at);
            let target = run_time.next_period();
            info!(job_id = %firing.job_id, %target, "monthly batch firing");

            match policy.run(|| runner.run(target, false, run_time)).await {
                Ok(outcomes) => {
                    let failed = outcomes.iter().filter(|o| !o.is_success()).count();
                    if failed > 0 {
                        info!(
                            failed,
                            total = outcomes.len(),
                            "batch completed with step failures"
                        );
                    }
                    Ok(())
                }
                Err(error) => Err(error.to_string()),
            }
        })
    })
}

/// Assemble the pipeline for one working directory.
fn build_runner(data_dir: &Path, log_dir: &Path) -> BatchRunner {
    let mut runner = BatchRunner::new(data_dir, log_dir);
    runner.register_post_step(Box::new(CleanMergeStep::new(CleanerConfig::new(data_dir))));
    runner
}
