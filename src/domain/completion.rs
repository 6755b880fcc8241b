/// Completion records and progress counters
///
/// A completion is an append-only event saying "this habit was performed at
/// this instant". Progress counters are the per-time-period tallies kept
/// alongside the schedule.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use crate::domain::{CompletionId, DomainError, HabitId, TimePeriod};

/// A record of performing a habit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub id: CompletionId,
    pub habit_id: HabitId,
    /// Unix epoch seconds
    pub completed_at: i64,
    pub notes: Option<String>,
}

/// Running counters for one scheduled time period of a habit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeProgress {
    pub time: TimePeriod,
    pub completed: i64,
    pub total: i64,
}

/// Parse a textual completion instant into epoch seconds
///
/// Accepts RFC 3339 (`2024-01-10T08:00:00Z`), a naive ISO datetime which is
/// read in local time, or a bare date meaning local midnight.
pub fn parse_timestamp(raw: &str) -> Result<i64, DomainError> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.timestamp());
    }

    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| DomainError::InvalidTimestamp(raw.to_string()))?;

    // A wall-clock time skipped by a DST jump has no local instant
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp())
        .ok_or_else(|| DomainError::InvalidTimestamp(raw.to_string()))
}
