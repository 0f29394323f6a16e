//! Merge and clean scraped artifacts into one combined table.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::CleanerError;
use crate::record::{CleanRecord, RawRecord};

/// Default combined output file name.
pub const DEFAULT_OUTPUT_NAME: &str = "cleaned_data.csv";

/// Output of the downstream categorization pass, never read as input.
const CATEGORIZED_OUTPUT_NAME: &str = "categorized_data.csv";

/// Name marker of rows scraped off a default/placeholder product image.
const PLACEHOLDER_NAME_MARKER: &str = "디폴트 이미지";

/// Configuration for one clean/merge pass.
#[derive(Debug, Clone)]
pub struct CleanerConfig {
    /// Directory scanned for CSV artifacts; also receives the output.
    pub data_dir: PathBuf,
    /// Combined output file name.
    pub output_name: String,
    /// File names never read as input (this pass's own output and any
    /// downstream outputs).
    pub exclude: Vec<String>,
    /// Rows whose name contains any of these markers are dropped.
    pub placeholder_markers: Vec<String>,
}

impl CleanerConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            output_name: DEFAULT_OUTPUT_NAME.to_string(),
            exclude: vec![
                DEFAULT_OUTPUT_NAME.to_string(),
                CATEGORIZED_OUTPUT_NAME.to_string(),
            ],
            placeholder_markers: vec![PLACEHOLDER_NAME_MARKER.to_string()],
        }
    }
}

/// What a clean/merge pass produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanSummary {
    /// Input files successfully decoded.
    pub files_read: usize,
    /// Rows surviving normalization, completeness, and dedup.
    pub rows_written: usize,
    pub output_path: PathBuf,
}

/// Merge every eligible CSV artifact in the working directory into one
/// cleaned output file.
///
/// A file that fails to decode is logged and skipped; sibling files still
/// merge. An empty eligible set is an error and writes nothing.
pub fn clean_and_merge(config: &CleanerConfig) -> Result<CleanSummary, CleanerError> {
    info!(dir = %config.data_dir.display(), "starting clean and merge");

    let inputs = eligible_inputs(config)?;
    if inputs.is_empty() {
        return Err(CleanerError::NoInputFiles {
            dir: config.data_dir.clone(),
        });
    }

    let mut seen = HashSet::new();
    let mut rows: Vec<CleanRecord> = Vec::new();
    let mut files_read = 0usize;

    for path in &inputs {
        match read_rows(path) {
            Ok(raw_rows) => {
                files_read += 1;
                info!(path = %path.display(), rows = raw_rows.len(), "artifact loaded");
                for raw in raw_rows {
                    let row = raw.normalize();
                    if !row.is_complete() {
                        continue;
                    }
                    if config
                        .placeholder_markers
                        .iter()
                        .any(|marker| row.name.contains(marker))
                    {
                        continue;
                    }
                    // First occurrence wins; later exact duplicates drop.
                    if seen.insert(row.clone()) {
                        rows.push(row);
                    }
                }
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "skipping unreadable artifact");
            }
        }
    }

    if files_read == 0 {
        return Err(CleanerError::NoInputFiles {
            dir: config.data_dir.clone(),
        });
    }

    let output_path = config.data_dir.join(&config.output_name);
    write_rows(&output_path, &rows)?;

    info!(
        files = files_read,
        rows = rows.len(),
        output = %output_path.display(),
        "clean and merge complete"
    );
    Ok(CleanSummary {
        files_read,
        rows_written: rows.len(),
        output_path,
    })
}

/// CSV files in the working directory minus the exclusion set, in stable
/// name order.
fn eligible_inputs(config: &CleanerConfig) -> Result<Vec<PathBuf>, CleanerError> {
    let mut inputs = Vec::new();
    for entry in fs::read_dir(&config.data_dir)? {
        let path = entry?.path();
        if !path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if config.exclude.iter().any(|excluded| excluded == name) {
            continue;
        }
        inputs.push(path);
    }
    inputs.sort();
    Ok(inputs)
}

fn read_rows(path: &Path) -> Result<Vec<RawRecord>, CleanerError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for result in reader.deserialize() {
        rows.push(result?);
    }
    Ok(rows)
}

fn write_rows(path: &Path, rows: &[CleanRecord]) -> Result<(), CleanerError> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
