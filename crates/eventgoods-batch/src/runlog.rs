//! Per-run audit logging.

use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::period::{KST_LABEL, RunInstant};

/// Append-only audit log for a single batch run.
///
/// One file per firing, bucketed by the month the job ran in. Every line
/// also goes to the live tracing output; a filesystem failure is swallowed
/// after a warning and the batch keeps running.
pub struct RunLogger {
    path: PathBuf,
    instant: RunInstant,
    label: String,
}

impl RunLogger {
    /// Create a logger for one firing. The bucket directory is created on
    /// first write, not here.
    pub fn new(log_root: impl AsRef<Path>, instant: RunInstant) -> Self {
        Self::with_label(log_root, instant, KST_LABEL)
    }

    /// Create a logger with an explicit zone label for the line prefix.
    pub fn with_label(
        log_root: impl AsRef<Path>,
        instant: RunInstant,
        label: impl Into<String>,
    ) -> Self {
        let path = log_root
            .as_ref()
            .join(instant.log_bucket())
            .join(instant.log_filename());
        Self {
            path,
            instant,
            label: label.into(),
        }
    }

    /// Path of the audit file this run appends to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line to the audit file and mirror it to tracing.
    pub fn write(&self, message: &str) {
        info!(target: "eventgoods::run", "{message}");
        if let Err(error) = self.append(message) {
            warn!(
                path = %self.path.display(),
                %error,
                "audit log write failed, continuing console-only"
            );
        }
    }

    fn append(&self, message: &str) -> std::io::Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "[{} {}] {}", self.instant.stamp(), self.label, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::default_offset;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn test_instant() -> RunInstant {
        RunInstant::new(
            default_offset()
                .with_ymd_and_hms(2026, 8, 28, 9, 30, 0)
                .unwrap(),
        )
    }

    #[test]
    fn writes_bucketed_timestamped_lines() {
        let root = tempfile::tempdir().unwrap();
        let log = RunLogger::new(root.path(), test_instant());

        log.write("=== BATCH START ===");
        log.write("Finished: cu");

        let expected_path = root.path().join("26_8").join("batch_20260828_093000.log");
        assert_eq!(log.path(), expected_path.as_path());

        let content = fs::read_to_string(&expected_path).unwrap();
        assert_eq!(
            content,
            "[2026-08-28 09:30:00 KST] === BATCH START ===\n\
             [2026-08-28 09:30:00 KST] Finished: cu\n"
        );
    }

    #[test]
    fn appends_across_logger_instances() {
        let root = tempfile::tempdir().unwrap();
        let instant = test_instant();

        RunLogger::new(root.path(), instant).write("first");
        RunLogger::new(root.path(), instant).write("second");

        let content = fs::read_to_string(
            root.path().join("26_8").join("batch_20260828_093000.log"),
        )
        .unwrap();
        assert!(content.contains("first\n"));
        assert!(content.ends_with("second\n"));
    }

    #[test]
    fn write_failure_does_not_panic() {
        let root = tempfile::tempdir().unwrap();
        // Occupy the bucket path with a file so directory creation fails.
        fs::write(root.path().join("26_8"), b"not a directory").unwrap();

        let log = RunLogger::new(root.path(), test_instant());
        log.write("still fine");
    }

    #[test]
    fn custom_label_in_prefix() {
        let root = tempfile::tempdir().unwrap();
        let log = RunLogger::with_label(root.path(), test_instant(), "UTC");
        log.write("hello");

        let content = fs::read_to_string(log.path()).unwrap();
        assert!(content.starts_with("[2026-08-28 09:30:00 UTC] hello"));
    }
}
