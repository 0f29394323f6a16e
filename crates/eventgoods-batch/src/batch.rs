//! The batch entry point: environment prep, step pipeline, audit brackets.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::BatchError;
use crate::period::{Period, RunInstant};
use crate::runlog::RunLogger;
use crate::step::{StepOutcome, StepProvider, run_steps};

/// Orchestrates one batch run: scrape steps first, then post-processing,
/// with an append-only audit trail bracketing the whole pipeline.
///
/// Steps are registered explicitly at startup, in execution order; the
/// runner never discovers or loads work lazily.
pub struct BatchRunner {
    data_dir: PathBuf,
    log_root: PathBuf,
    scrape_steps: Vec<Box<dyn StepProvider>>,
    post_steps: Vec<Box<dyn StepProvider>>,
}

impl BatchRunner {
    /// Create a runner with empty step registries.
    pub fn new(data_dir: impl Into<PathBuf>, log_root: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            log_root: log_root.into(),
            scrape_steps: Vec::new(),
            post_steps: Vec::new(),
        }
    }

    /// Register a scrape source. Registration order is execution order.
    pub fn register_scrape_step(&mut self, step: Box<dyn StepProvider>) {
        self.scrape_steps.push(step);
    }

    /// Register a post-processing stage, run after every scrape source.
    pub fn register_post_step(&mut self, step: Box<dyn StepProvider>) {
        self.post_steps.push(step);
    }

    /// Directory scrape steps write their artifacts into.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Run the full pipeline for one firing.
    ///
    /// Partial step failure is still `Ok`: the `Err` arm is reserved for
    /// faults escaping the pipeline itself, which is the tier the retry
    /// policy reacts to. A dry run skips the scrape steps but still runs
    /// post-processing, so wiring can be validated end to end.
    pub async fn run(
        &self,
        target: Period,
        dry_run: bool,
        run_time: RunInstant,
    ) -> Result<Vec<StepOutcome>, BatchError> {
        self.prepare_env()?;

        let log = RunLogger::new(&self.log_root, run_time);
        log.write("=== BATCH START ===");
        log.write(&format!(
            "Target: {target} | Execute At: {}",
            run_time.stamp()
        ));
        for step in &self.scrape_steps {
            log.write(&format!("Registered source: {}", step.name()));
        }

        let mut outcomes = Vec::new();
        if dry_run {
            log.write("Dry run enabled: skipping scrape step execution.");
        } else {
            outcomes.extend(run_steps(&self.scrape_steps, run_time, &log).await);
        }

        outcomes.extend(run_steps(&self.post_steps, run_time, &log).await);

        log.write("=== BATCH COMPLETE ===");
        Ok(outcomes)
    }

    /// Create the working and log directories if absent.
    fn prepare_env(&self) -> Result<(), BatchError> {
        fs::create_dir_all(&self.data_dir)?;
        fs::create_dir_all(&self.log_root)?;
        Ok(())
    }
}
