/// Calendar event endpoints

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{non_blank, ApiError, AppState};
use crate::calendar::{CalendarEvent, EventId};
use crate::domain::{parse_all, Day};

#[derive(Debug, Deserialize)]
pub struct ScheduleHabitParams {
    pub summary: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(default)]
    pub attendees_emails: Vec<String>,
    pub repeat_until: Option<String>,
    #[serde(default)]
    pub days: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskParams {
    pub summary: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RescheduleParams {
    pub event_name: Option<String>,
    pub new_start_time: Option<String>,
    pub new_end_time: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    /// `YYYY-MM-DD`; today (UTC) when absent
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EventLinkResponse {
    pub id: EventId,
    pub link: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

impl From<&CalendarEvent> for EventLinkResponse {
    fn from(event: &CalendarEvent) -> Self {
        Self {
            id: event.id,
            link: event.link(),
        }
    }
}

pub async fn schedule_habit(
    State(state): State<AppState>,
    Json(params): Json<ScheduleHabitParams>,
) -> Result<Json<EventLinkResponse>, ApiError> {
    let summary = non_blank(params.summary).ok_or_else(|| ApiError::missing("summary"))?;
    let start = required_time(params.start_time, "start_time")?;
    let end = required_time(params.end_time, "end_time")?;
    let repeat_until = non_blank(params.repeat_until)
        .map(|raw| parse_event_time(&raw))
        .transpose()?;
    let days: Vec<Day> = parse_all(&params.days)?;

    let event = CalendarEvent::habit(summary, start, end, params.attendees_emails, repeat_until, &days)?;
    let response = EventLinkResponse::from(&event);
    state.events.insert(event);

    Ok(Json(response))
}

pub async fn create_task(
    State(state): State<AppState>,
    Json(params): Json<CreateTaskParams>,
) -> Result<Json<EventLinkResponse>, ApiError> {
    let summary = non_blank(params.summary).ok_or_else(|| ApiError::missing("summary"))?;
    let start = required_time(params.start_time, "start_time")?;
    let end = required_time(params.end_time, "end_time")?;

    let event = CalendarEvent::task(summary, start, end)?;
    let response = EventLinkResponse::from(&event);
    state.events.insert(event);

    Ok(Json(response))
}

pub async fn reschedule(
    State(state): State<AppState>,
    Json(params): Json<RescheduleParams>,
) -> Result<Json<EventLinkResponse>, ApiError> {
    let name = non_blank(params.event_name).ok_or_else(|| ApiError::missing("event_name"))?;
    let start = required_time(params.new_start_time, "new_start_time")?;
    let end = required_time(params.new_end_time, "new_end_time")?;

    let event = state
        .events
        .reschedule(&name, start, end)?
        .ok_or_else(|| ApiError::NotFound(format!("No events found with name: {}", name)))?;

    Ok(Json(EventLinkResponse::from(&event)))
}

/// Events starting on a given day
pub async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<DayQuery>,
) -> Result<Json<Vec<CalendarEvent>>, ApiError> {
    let date = match non_blank(params.date) {
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map_err(|_| ApiError::Validation(format!("Invalid date '{}'", raw)))?,
        None => Utc::now().date_naive(),
    };

    Ok(Json(state.events.list_for_day(date)))
}

pub async fn view_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CalendarEvent>, ApiError> {
    // Ids are opaque to clients: a malformed one is just an unknown one
    let event = id
        .parse::<EventId>()
        .ok()
        .and_then(|id| state.events.get(id))
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    Ok(Json(event))
}

pub async fn clear_events(State(state): State<AppState>) -> Json<StatusResponse> {
    state.events.clear();
    Json(StatusResponse { status: "cleared" })
}

fn required_time(raw: Option<String>, field: &str) -> Result<DateTime<Utc>, ApiError> {
    let raw = non_blank(raw).ok_or_else(|| ApiError::missing(field))?;
    parse_event_time(&raw)
}

/// RFC 3339, or a naive ISO datetime taken as UTC
fn parse_event_time(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .map(|naive| naive.and_utc())
        .map_err(|_| ApiError::Validation(format!("Invalid date/time '{}'", raw)))
}
