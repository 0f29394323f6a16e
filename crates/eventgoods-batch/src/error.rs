//! Error types for the batch pipeline.

use thiserror::Error;

/// A fault escaping the entire pipeline invocation.
///
/// Step-level failures are absorbed by the step runner and never surface
/// here; this tier covers environment and configuration faults, and it is
/// the only tier the retry policy reacts to.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Failed to prepare the working or log directories.
    #[error("failed to prepare environment: {0}")]
    Io(#[from] std::io::Error),

    /// A target month outside the calendar.
    #[error("invalid target month: {month} (expected 1-12)")]
    InvalidPeriod { month: u32 },
}

/// A failure raised by a single step.
///
/// Recorded and logged by the step runner, never escalated past it.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct StepError {
    message: String,
}

impl StepError {
    /// Create a step error from any displayable detail.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for StepError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for StepError {
    fn from(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

impl From<std::io::Error> for StepError {
    fn from(error: std::io::Error) -> Self {
        Self {
            message: error.to_string(),
        }
    }
}

/// Retry exhaustion for a whole-pipeline fault.
#[derive(Debug, Error)]
pub enum RetryError {
    /// Every attempt failed; carries the last pipeline fault.
    #[error("all {attempts} attempts failed")]
    Exhausted {
        /// Total invocations of the unit of work, including the first.
        attempts: u32,
        #[source]
        source: BatchError,
    },
}
