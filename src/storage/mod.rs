/// Storage layer for persisting habit data
///
/// This module handles all database operations using SQLite. It provides
/// a clean interface for storing habits with their schedules, recording
/// completions and reading back derived statistics.

pub mod sqlite;
pub mod migrations;

// Re-export the main storage types
pub use sqlite::*;

use thiserror::Error;
use crate::domain::{
    Category, Completion, CompletionId, Day, DomainError, Habit, HabitId, HabitStats, HabitUpdate,
    NewHabit, TimePeriod, TimeProgress,
};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Database query error: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("Habit not found: {habit_id}")]
    HabitNotFound { habit_id: HabitId },

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Database lock poisoned")]
    LockPoisoned,

    #[error("Migration error: {0}")]
    Migration(String),
}

/// Trait defining the storage interface for habits
///
/// Handlers only see this trait, so the SQLite implementation can be
/// swapped without touching the HTTP layer.
pub trait HabitStorage: Send + Sync {
    /// Insert a habit with its initial days and times; returns the new id
    fn create_habit(&self, habit: &NewHabit) -> Result<HabitId, StorageError>;

    /// Replace every scheduled day of a habit
    fn set_days(&self, habit_id: HabitId, days: &[Day]) -> Result<(), StorageError>;

    /// Replace every scheduled time period of a habit (counters restart at zero)
    fn set_times(&self, habit_id: HabitId, times: &[TimePeriod]) -> Result<(), StorageError>;

    /// Apply a partial update; fails with `HabitNotFound` for an unknown id
    fn update_habit(&self, habit_id: HabitId, update: &HabitUpdate) -> Result<HabitId, StorageError>;

    /// Delete a habit and everything it owns. Deleting twice is not an error.
    fn delete_habit(&self, habit_id: HabitId) -> Result<(), StorageError>;

    /// Get the full habit aggregate, or `None` when it doesn't exist
    fn get_habit(&self, habit_id: HabitId) -> Result<Option<Habit>, StorageError>;

    /// List habits by priority (descending) then clock time (ascending)
    fn list_habits(&self, category: Option<Category>) -> Result<Vec<Habit>, StorageError>;

    /// Habits scheduled on `day`, and in `time` when given
    fn list_habits_for_day(
        &self,
        day: Day,
        time: Option<TimePeriod>,
    ) -> Result<Vec<Habit>, StorageError>;

    /// Append a completion and bump every time-period counter of the habit
    fn record_completion(
        &self,
        habit_id: HabitId,
        completed_at: i64,
        notes: Option<&str>,
    ) -> Result<CompletionId, StorageError>;

    /// Completion records, newest first
    fn get_completions(&self, habit_id: HabitId) -> Result<Vec<Completion>, StorageError>;

    /// Total and streak derived from the completion log
    fn get_stats(&self, habit_id: HabitId) -> Result<HabitStats, StorageError>;

    /// Per-time-period completion counters
    fn get_progress(&self, habit_id: HabitId) -> Result<Vec<TimeProgress>, StorageError>;

    /// Current remark, empty when none has been written yet
    fn get_remark(&self, habit_id: HabitId) -> Result<String, StorageError>;

    /// Overwrite the remark
    fn set_remark(&self, habit_id: HabitId, remark: &str) -> Result<(), StorageError>;
}
