/// Calendar events for scheduled habits and one-off tasks
///
/// Events live only as long as the process. Handlers receive the store
/// through `EventStore`, never through global state.

pub mod memory;
pub mod rrule;

pub use memory::*;
pub use rrule::*;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::Day;

/// Errors from calendar operations
#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("Event ends before it starts")]
    EndBeforeStart,

    #[error("Invalid event ID '{0}'")]
    InvalidId(String),
}

/// Unique identifier for a calendar event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EventId {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(EventId)
            .map_err(|_| CalendarError::InvalidId(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    /// Recurring event backing a habit
    Habit,
    /// One-off event
    Task,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendee {
    pub email: String,
}

/// A scheduled event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: EventId,
    pub summary: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<Attendee>,
    /// RRULE lines; empty for one-off events
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recurrence: Vec<String>,
    pub event_type: EventType,
}

impl CalendarEvent {
    /// A recurring event repeating on `days` (every day when empty)
    pub fn habit(
        summary: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        attendees: Vec<String>,
        repeat_until: Option<DateTime<Utc>>,
        days: &[Day],
    ) -> Result<Self, CalendarError> {
        check_span(start, end)?;

        Ok(Self {
            id: EventId::new(),
            summary,
            start,
            end,
            attendees: attendees.into_iter().map(|email| Attendee { email }).collect(),
            recurrence: vec![recurrence_rule(days, repeat_until)],
            event_type: EventType::Habit,
        })
    }

    /// A one-off event
    pub fn task(summary: String, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, CalendarError> {
        check_span(start, end)?;

        Ok(Self {
            id: EventId::new(),
            summary,
            start,
            end,
            attendees: Vec::new(),
            recurrence: Vec::new(),
            event_type: EventType::Task,
        })
    }

    /// Path at which the event can be looked up
    pub fn link(&self) -> String {
        format!("/events/{}", self.id)
    }

    /// Whether the event starts on `date` (UTC)
    pub fn starts_on(&self, date: NaiveDate) -> bool {
        self.start.date_naive() == date
    }
}

fn check_span(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), CalendarError> {
    if end < start {
        return Err(CalendarError::EndBeforeStart);
    }
    Ok(())
}

/// Process-scoped registry of calendar events
pub trait EventStore: Send + Sync {
    /// Store an event and return its id
    fn insert(&self, event: CalendarEvent) -> EventId;

    fn get(&self, id: EventId) -> Option<CalendarEvent>;

    /// Move the first event named `summary`; `None` when nothing matches
    fn reschedule(
        &self,
        summary: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Option<CalendarEvent>, CalendarError>;

    /// Events starting on `date`, in insertion order
    fn list_for_day(&self, date: NaiveDate) -> Vec<CalendarEvent>;

    /// Drop every event
    fn clear(&self);
}
