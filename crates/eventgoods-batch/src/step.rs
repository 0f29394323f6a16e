//! Pipeline steps and the step runner.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::StepError;
use crate::period::RunInstant;
use crate::runlog::RunLogger;

/// One unit of work within a batch run: a single source scrape or a
/// post-processing stage.
///
/// Implementations receive the firing instant explicitly; a step must not
/// consult ambient wall-clock state to decide what period it works on.
#[async_trait]
pub trait StepProvider: Send + Sync {
    /// Name used in step outcomes and audit log lines.
    fn name(&self) -> &str;

    /// Execute the step. Errors are recorded and absorbed by the runner.
    async fn run(&self, as_of: RunInstant) -> Result<(), StepError>;
}

/// Adapter for steps that are a bare async function rather than a type.
pub struct FnStep {
    name: String,
    work: Box<dyn Fn(RunInstant) -> BoxFuture<'static, Result<(), StepError>> + Send + Sync>,
}

impl FnStep {
    /// Wrap a closure returning a boxed step future.
    pub fn new<F>(name: impl Into<String>, work: F) -> Self
    where
        F: Fn(RunInstant) -> BoxFuture<'static, Result<(), StepError>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            work: Box::new(work),
        }
    }
}

#[async_trait]
impl StepProvider for FnStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, as_of: RunInstant) -> Result<(), StepError> {
        (self.work)(as_of).await
    }
}

/// Whether a step completed or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Success,
    Failed,
}

/// The immutable record of one step execution within one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutcome {
    /// Step name as reported by the provider.
    pub step: String,
    pub status: StepStatus,
    /// Failure detail, present iff status is `Failed`.
    pub error: Option<String>,
    /// When the outcome was recorded.
    pub at: DateTime<FixedOffset>,
}

impl StepOutcome {
    pub fn is_success(&self) -> bool {
        self.status == StepStatus::Success
    }
}

/// Execute steps in order, absorbing per-step failures.
///
/// One source failing must not block the others or the post-processing
/// stage: a failed step is recorded and logged, and the runner moves on.
/// No state is held between calls.
pub async fn run_steps(
    steps: &[Box<dyn StepProvider>],
    as_of: RunInstant,
    log: &RunLogger,
) -> Vec<StepOutcome> {
    let mut outcomes = Vec::with_capacity(steps.len());
    for step in steps {
        let name = step.name().to_string();
        let outcome = match step.run(as_of).await {
            Ok(()) => {
                log.write(&format!("Finished: {name}"));
                StepOutcome {
                    step: name,
                    status: StepStatus::Success,
                    error: None,
                    at: recorded_at(as_of),
                }
            }
            Err(error) => {
                log.write(&format!("{name} failed: {error}"));
                StepOutcome {
                    step: name,
                    status: StepStatus::Failed,
                    error: Some(error.to_string()),
                    at: recorded_at(as_of),
                }
            }
        };
        outcomes.push(outcome);
    }
    outcomes
}

fn recorded_at(as_of: RunInstant) -> DateTime<FixedOffset> {
    Utc::now().with_timezone(as_of.at().offset())
}
