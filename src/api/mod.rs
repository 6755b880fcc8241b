/// HTTP surface of the habit tracker
///
/// Handlers are thin: they parse the request into domain types, call the
/// storage, text or calendar layer, and shape the JSON response. All shared
/// resources come in through `AppState`.

pub mod completions;
pub mod error;
pub mod events;
pub mod habits;
pub mod text;

pub use error::ApiError;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::calendar::EventStore;
use crate::domain::{parse_timestamp, HabitId};
use crate::storage::HabitStorage;
use crate::text::{ProfileSummarizer, TextCapabilities, TextMerger};

/// Resources shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn HabitStorage>,
    pub merger: Arc<dyn TextMerger>,
    pub profiler: Arc<dyn ProfileSummarizer>,
    pub events: Arc<dyn EventStore>,
}

impl AppState {
    pub fn new(
        storage: Arc<dyn HabitStorage>,
        text: TextCapabilities,
        events: Arc<dyn EventStore>,
    ) -> Self {
        Self {
            storage,
            merger: text.merger,
            profiler: text.profiler,
            events,
        }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/habits", get(habits::list_habits).post(habits::create_habit))
        .route("/habits/list", post(habits::list_habits_by_body))
        .route("/habits/get", post(habits::get_habit_by_body))
        .route("/habits/update", post(habits::update_habit))
        .route("/habits/delete", post(habits::delete_habit))
        .route("/habits/by-day", get(habits::habits_by_day))
        .route("/habits/:id", get(habits::get_habit))
        .route("/habits/:id/progress", get(habits::habit_progress))
        .route("/completions", post(completions::add_completion))
        .route(
            "/completions/list",
            get(completions::list_completions).post(completions::list_completions_by_body),
        )
        .route("/stats", get(completions::habit_stats))
        .route("/remarks", post(text::merge_remark))
        .route("/profile", post(text::generate_profile))
        .route("/events/habit", post(events::schedule_habit))
        .route("/events/task", post(events::create_task))
        .route("/events/reschedule", post(events::reschedule))
        .route("/events/today", get(events::list_events))
        .route("/events/clear", post(events::clear_events))
        .route("/events/:id", get(events::view_event))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

/// A habit id as clients send it: a JSON number or a numeric string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IdValue {
    Number(i64),
    Text(String),
}

impl IdValue {
    pub fn habit_id(&self) -> Result<HabitId, ApiError> {
        match self {
            IdValue::Number(n) => Ok(HabitId(*n)),
            IdValue::Text(s) => Ok(s.parse::<HabitId>()?),
        }
    }
}

/// Resolve an optional id field, rejecting its absence
pub fn require_habit_id(id: Option<&IdValue>) -> Result<HabitId, ApiError> {
    id.ok_or_else(|| ApiError::missing("habit_id"))?.habit_id()
}

/// Parse an id arriving as a path segment or query value
pub fn parse_habit_id(raw: &str) -> Result<HabitId, ApiError> {
    Ok(raw.parse::<HabitId>()?)
}

/// A completion instant: epoch seconds or a date/time string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TimestampValue {
    Epoch(i64),
    Float(f64),
    Text(String),
}

impl TimestampValue {
    pub fn epoch_seconds(&self) -> Result<i64, ApiError> {
        match self {
            TimestampValue::Epoch(ts) => Ok(*ts),
            TimestampValue::Float(ts) => Ok(ts.trunc() as i64),
            TimestampValue::Text(raw) => Ok(parse_timestamp(raw)?),
        }
    }
}

/// Treat blank query/body strings as absent
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
