//! Run instants and target-period math.

use chrono::{DateTime, Datelike, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BatchError;

/// Seconds east of UTC for Korea Standard Time, the zone the scraped
/// sources publish their promotion schedules in.
pub const KST_OFFSET_SECS: i32 = 9 * 3600;

/// Zone label appended to every audit log line.
pub const KST_LABEL: &str = "KST";

/// The fixed offset used when no other zone is configured.
pub fn default_offset() -> FixedOffset {
    FixedOffset::east_opt(KST_OFFSET_SECS).expect("KST offset is in range")
}

/// The wall-clock instant associated with one batch firing.
///
/// Used both for target-period computation and for log placement. The log
/// bucket is keyed to the month the job *ran* in, not the month it fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInstant(DateTime<FixedOffset>);

impl RunInstant {
    /// The current instant in the default zone.
    pub fn now() -> Self {
        Self(Utc::now().with_timezone(&default_offset()))
    }

    /// Wrap an explicit firing instant.
    pub fn new(at: DateTime<FixedOffset>) -> Self {
        Self(at)
    }

    /// The underlying instant.
    pub fn at(&self) -> DateTime<FixedOffset> {
        self.0
    }

    /// The calendar month after this instant's month.
    ///
    /// The year increments exactly once, on the December to January roll.
    pub fn next_period(&self) -> Period {
        let month = (self.0.month() % 12) + 1;
        let year = self.0.year() + if self.0.month() == 12 { 1 } else { 0 };
        Period { year, month }
    }

    /// Log bucket directory name, `{YY}_{M}` with the month not zero-padded.
    pub fn log_bucket(&self) -> String {
        format!("{:02}_{}", self.0.year() % 100, self.0.month())
    }

    /// Log file name, unique for runs at least one second apart.
    pub fn log_filename(&self) -> String {
        self.0.format("batch_%Y%m%d_%H%M%S.log").to_string()
    }

    /// Timestamp used in audit lines and scheduler snapshots.
    pub fn stamp(&self) -> String {
        self.0.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

impl From<DateTime<FixedOffset>> for RunInstant {
    fn from(at: DateTime<FixedOffset>) -> Self {
        Self(at)
    }
}

/// A target calendar period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    /// Build a period, rejecting months outside the calendar.
    pub fn new(year: i32, month: u32) -> Result<Self, BatchError> {
        if !(1..=12).contains(&month) {
            return Err(BatchError::InvalidPeriod { month });
        }
        Ok(Self { year, month })
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.year, self.month)
    }
}
