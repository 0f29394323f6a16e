//! Scheduler types and monthly trigger math.

use chrono::{DateTime, Datelike, FixedOffset, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;

/// A recurring monthly trigger: fire on `day` at `hour:minute` in a fixed
/// zone, once per month.
///
/// Months lacking the requested day (the 31st in April, the 29th in a
/// non-leap February) are skipped, like a cron day-of-month field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDefinition {
    /// Unique job id; re-registering the same id replaces the prior
    /// definition.
    pub id: String,
    /// Day of month, 1-31.
    pub day: u32,
    /// Hour of day, 0-23.
    pub hour: u32,
    /// Minute of hour, 0-59.
    pub minute: u32,
}

impl JobDefinition {
    /// Build a definition, rejecting out-of-range trigger fields.
    pub fn new(
        id: impl Into<String>,
        day: u32,
        hour: u32,
        minute: u32,
    ) -> Result<Self, SchedulerError> {
        let def = Self {
            id: id.into(),
            day,
            hour,
            minute,
        };
        def.validate()?;
        Ok(def)
    }

    /// Check the trigger fields against their calendar ranges.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        let detail = if !(1..=31).contains(&self.day) {
            Some(format!("day {} out of range 1-31", self.day))
        } else if self.hour > 23 {
            Some(format!("hour {} out of range 0-23", self.hour))
        } else if self.minute > 59 {
            Some(format!("minute {} out of range 0-59", self.minute))
        } else {
            None
        };

        match detail {
            Some(detail) => Err(SchedulerError::InvalidTrigger {
                id: self.id.clone(),
                detail,
            }),
            None => Ok(()),
        }
    }

    /// The next instant matching this trigger strictly after `now`.
    ///
    /// Walks forward month by month; since every year has months with 31
    /// days, a valid definition always resolves.
    pub fn next_fire_after(&self, now: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        let zone = now.timezone();
        let mut year = now.year();
        let mut month = now.month();
        loop {
            if let Some(candidate) = zone
                .with_ymd_and_hms(year, month, self.day, self.hour, self.minute, 0)
                .single()
                && candidate > now
            {
                return candidate;
            }
            month += 1;
            if month > 12 {
                month = 1;
                year += 1;
            }
        }
    }
}

/// One scheduler-triggered invocation of the batch job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Firing {
    pub job_id: String,
    /// The wall-clock instant the firing started executing.
    pub fired_at: DateTime<FixedOffset>,
}

/// Registry entry for one job id.
#[derive(Debug, Clone)]
pub(crate) struct ScheduledJob {
    pub def: JobDefinition,
    pub next_fire: DateTime<FixedOffset>,
    pub last_fire: Option<DateTime<FixedOffset>>,
    pub last_error: Option<String>,
}

/// Read-only snapshot of schedule state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerInfo {
    pub is_running: bool,
    pub jobs: Vec<JobInfo>,
}

/// Snapshot row for one registered job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobInfo {
    pub id: String,
    /// `None` while the scheduler is not running; display layers render it
    /// as "N/A".
    pub next_fire_time: Option<String>,
    pub last_fire_time: Option<String>,
    /// Failure detail from the most recent firing, if it failed.
    pub last_error: Option<String>,
}

pub(crate) fn stamp(at: DateTime<FixedOffset>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}
