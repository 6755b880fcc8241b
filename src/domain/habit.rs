/// Habit entity and related functionality
///
/// This module defines the denormalized Habit aggregate (the habit row plus
/// its scheduled days and time periods), the validated input for creating a
/// habit, and the partial update applied to an existing one.

use serde::{Deserialize, Serialize};
use crate::domain::{Category, Day, DomainError, HabitId, TimePeriod};

/// A habit represents a routine the user wants to do regularly
///
/// Field names on the wire follow the storage columns (`ID`, `Desc`, ...)
/// which is the shape existing clients already consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    #[serde(rename = "ID")]
    pub id: HabitId,
    /// What the habit is (e.g. "Morning run")
    #[serde(rename = "Desc")]
    pub description: String,
    /// Higher sorts first
    #[serde(rename = "Priority")]
    pub priority: i64,
    #[serde(rename = "Preferences")]
    pub preferences: i64,
    #[serde(rename = "Type")]
    pub category: Category,
    /// Free-text clock time such as "07:30"; sorted as a plain string
    #[serde(rename = "Time")]
    pub time: String,
    /// Accumulated natural-language annotation
    #[serde(rename = "Remarks")]
    pub remarks: Option<String>,
    pub days: Vec<Day>,
    pub times: Vec<TimeSlot>,
}

/// One scheduled time period of a habit, serialized as `{"time": "Morning"}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub time: TimePeriod,
}

impl From<TimePeriod> for TimeSlot {
    fn from(time: TimePeriod) -> Self {
        Self { time }
    }
}

impl Habit {
    /// The scheduled periods without the wire wrapper
    pub fn time_periods(&self) -> Vec<TimePeriod> {
        self.times.iter().map(|slot| slot.time).collect()
    }
}

/// Validated input for creating a habit together with its schedule
#[derive(Debug, Clone, PartialEq)]
pub struct NewHabit {
    pub description: String,
    pub priority: i64,
    pub preferences: i64,
    pub category: Category,
    pub time: String,
    pub remarks: Option<String>,
    pub days: Vec<Day>,
    pub times: Vec<TimePeriod>,
}

impl NewHabit {
    /// Create a new habit description with validation
    ///
    /// The schedule starts empty; attach it with `with_days`/`with_times`.
    pub fn new(
        description: String,
        priority: i64,
        preferences: i64,
        category: Category,
        time: String,
        remarks: Option<String>,
    ) -> Result<Self, DomainError> {
        validate_description(&description)?;

        Ok(Self {
            description,
            priority,
            preferences,
            category,
            time,
            remarks,
            days: Vec::new(),
            times: Vec::new(),
        })
    }

    pub fn with_days(mut self, days: Vec<Day>) -> Self {
        self.days = days;
        self
    }

    pub fn with_times(mut self, times: Vec<TimePeriod>) -> Self {
        self.times = times;
        self
    }
}

/// Partial update of a habit
///
/// `None` means "leave untouched". When `days` or `times` is present the
/// whole association set is replaced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HabitUpdate {
    pub description: Option<String>,
    pub priority: Option<i64>,
    pub preferences: Option<i64>,
    pub category: Option<Category>,
    pub time: Option<String>,
    pub remarks: Option<String>,
    pub days: Option<Vec<Day>>,
    pub times: Option<Vec<TimePeriod>>,
}

impl HabitUpdate {
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(ref desc) = self.description {
            validate_description(desc)?;
        }
        Ok(())
    }

    /// Whether any column of the habit row itself changes
    pub fn touches_row(&self) -> bool {
        self.description.is_some()
            || self.priority.is_some()
            || self.preferences.is_some()
            || self.category.is_some()
            || self.time.is_some()
            || self.remarks.is_some()
    }
}

fn validate_description(description: &str) -> Result<(), DomainError> {
    if description.trim().is_empty() {
        return Err(DomainError::EmptyDescription);
    }
    Ok(())
}
