/// In-memory event store

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, NaiveDate, Utc};

use crate::calendar::{CalendarError, CalendarEvent, EventId, EventStore};

/// Events kept in insertion order behind a lock
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    events: RwLock<Vec<CalendarEvent>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Poisoning is ignored: every write is a single Vec operation
    fn read(&self) -> RwLockReadGuard<'_, Vec<CalendarEvent>> {
        self.events.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<CalendarEvent>> {
        self.events.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventStore for InMemoryEventStore {
    fn insert(&self, event: CalendarEvent) -> EventId {
        let id = event.id;
        tracing::debug!("Scheduled {:?} event {} ({})", event.event_type, id, event.summary);
        self.write().push(event);
        id
    }

    fn get(&self, id: EventId) -> Option<CalendarEvent> {
        self.read().iter().find(|event| event.id == id).cloned()
    }

    fn reschedule(
        &self,
        summary: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Option<CalendarEvent>, CalendarError> {
        if end < start {
            return Err(CalendarError::EndBeforeStart);
        }

        let mut events = self.write();
        let Some(event) = events.iter_mut().find(|event| event.summary == summary) else {
            return Ok(None);
        };

        event.start = start;
        event.end = end;
        tracing::debug!("Rescheduled event {} ({})", event.id, summary);
        Ok(Some(event.clone()))
    }

    fn list_for_day(&self, date: NaiveDate) -> Vec<CalendarEvent> {
        self.read()
            .iter()
            .filter(|event| event.starts_on(date))
            .cloned()
            .collect()
    }

    fn clear(&self) {
        let mut events = self.write();
        tracing::debug!("Clearing {} calendar events", events.len());
        events.clear();
    }
}
