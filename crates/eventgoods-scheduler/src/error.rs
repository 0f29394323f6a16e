//! Error types for the scheduler.

use thiserror::Error;

/// Errors that can occur in scheduler operations.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A trigger field outside its calendar range.
    #[error("invalid trigger for job {id}: {detail}")]
    InvalidTrigger { id: String, detail: String },
}
