//! Calendar-triggered job scheduler for eventgoods.
//!
//! This crate provides an in-process scheduler that:
//! - registers monthly day/hour/minute triggers keyed by job id
//! - replaces an existing registration on id collision (idempotent upsert)
//! - fires due jobs sequentially from one background task
//! - exposes a read-only snapshot of schedule state

mod error;
mod scheduler;
mod types;

pub use error::SchedulerError;
pub use scheduler::{FiringExecutor, Scheduler};
pub use types::{Firing, JobDefinition, JobInfo, SchedulerInfo};
