//! Error types for the cleaner.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while merging scraped artifacts.
#[derive(Debug, Error)]
pub enum CleanerError {
    /// No eligible input artifacts to merge; nothing is written.
    #[error("no CSV artifacts to process in {}", dir.display())]
    NoInputFiles { dir: PathBuf },

    /// Filesystem error while scanning or writing.
    #[error("artifact I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV content.
    #[error("artifact decode failed: {0}")]
    Csv(#[from] csv::Error),
}
