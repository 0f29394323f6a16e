//! Batch pipeline core for the monthly promotional-data fetch.
//!
//! This crate owns the orchestration logic:
//! - target-period and log-path math keyed to a firing instant
//! - a per-run append-only audit log bucketed by execution month
//! - ordered step execution with per-step failure isolation
//! - bounded fixed-delay retry around the whole pipeline

mod batch;
mod error;
mod period;
mod retry;
mod runlog;
mod step;

pub use batch::BatchRunner;
pub use error::{BatchError, RetryError, StepError};
pub use period::{KST_LABEL, KST_OFFSET_SECS, Period, RunInstant, default_offset};
pub use retry::{DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY, RetryPolicy};
pub use runlog::RunLogger;
pub use step::{FnStep, StepOutcome, StepProvider, StepStatus, run_steps};
