//! CSV clean/merge post-processing for eventgoods.
//!
//! Scrape steps each write their own CSV artifact; this crate merges every
//! eligible artifact in the working directory into one cleaned dataset:
//! prices coerced to non-negative integers, incomplete rows dropped,
//! placeholder rows dropped, exact duplicates removed.

mod cleaner;
mod error;
mod record;
mod step;

pub use cleaner::{CleanSummary, CleanerConfig, clean_and_merge};
pub use error::CleanerError;
pub use record::{CleanRecord, RawRecord, normalize_price};
pub use step::CleanMergeStep;
