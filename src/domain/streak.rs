/// Streak calculation from the raw completion log
///
/// Statistics are always derived from completion timestamps, never from the
/// per-period counters. A streak is the run of consecutive calendar days
/// ending at the most recent completion, whether or not that day is today.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

/// Completion statistics for a habit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HabitStats {
    /// Number of completion records (not distinct days)
    pub total: u32,
    /// Consecutive days ending at the most recent completion
    #[serde(rename = "streakDays")]
    pub streak_days: u32,
}

impl HabitStats {
    /// Calculate statistics from completion instants
    ///
    /// `tz` decides which calendar date an instant falls on.
    pub fn from_timestamps<Tz: TimeZone>(timestamps: &[i64], tz: &Tz) -> Self {
        let total = saturating_count(timestamps.len());
        if total == 0 {
            return Self::default();
        }

        let dates: BTreeSet<NaiveDate> = timestamps
            .iter()
            .filter_map(|&ts| DateTime::from_timestamp(ts, 0))
            .map(|utc| utc.with_timezone(tz).date_naive())
            .collect();

        Self {
            total,
            streak_days: current_streak(&dates).max(1),
        }
    }
}

fn saturating_count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

/// Walk distinct dates newest-first, counting while each is the day before
/// the previous one
fn current_streak(dates: &BTreeSet<NaiveDate>) -> u32 {
    let mut newest_first = dates.iter().rev();
    let Some(mut current) = newest_first.next().copied() else {
        return 0;
    };

    let mut streak = 1;
    for &date in newest_first {
        if current.pred_opt() != Some(date) {
            break;
        }
        streak += 1;
        current = date;
    }
    streak
}
