/// Completion logging, history and statistics endpoints

use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::{non_blank, parse_habit_id, require_habit_id, ApiError, AppState, IdValue, TimestampValue};
use crate::domain::{Completion, CompletionId, HabitStats};

/// Parameters for logging a completion
#[derive(Debug, Deserialize)]
pub struct AddCompletionParams {
    pub habit_id: Option<IdValue>,
    /// Defaults to now
    pub completed_at: Option<TimestampValue>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AddCompletionResponse {
    pub id: CompletionId,
}

#[derive(Debug, Deserialize)]
pub struct CompletionsQuery {
    pub habit_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionsBody {
    pub habit_id: Option<IdValue>,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub id: Option<String>,
}

pub async fn add_completion(
    State(state): State<AppState>,
    Json(params): Json<AddCompletionParams>,
) -> Result<Json<AddCompletionResponse>, ApiError> {
    let habit_id = require_habit_id(params.habit_id.as_ref())?;
    let completed_at = match params.completed_at {
        Some(value) => value.epoch_seconds()?,
        None => Utc::now().timestamp(),
    };

    let id = state
        .storage
        .record_completion(habit_id, completed_at, params.notes.as_deref())?;

    tracing::info!("Logged completion {} for habit {}", id, habit_id);
    Ok(Json(AddCompletionResponse { id }))
}

/// `GET /completions/list?habit_id=`
pub async fn list_completions(
    State(state): State<AppState>,
    Query(params): Query<CompletionsQuery>,
) -> Result<Json<Vec<Completion>>, ApiError> {
    let raw = non_blank(params.habit_id).ok_or_else(|| ApiError::missing("habit_id"))?;
    let habit_id = parse_habit_id(&raw)?;
    Ok(Json(state.storage.get_completions(habit_id)?))
}

pub async fn list_completions_by_body(
    State(state): State<AppState>,
    Json(params): Json<CompletionsBody>,
) -> Result<Json<Vec<Completion>>, ApiError> {
    let habit_id = require_habit_id(params.habit_id.as_ref())?;
    Ok(Json(state.storage.get_completions(habit_id)?))
}

/// `GET /stats?id=`
pub async fn habit_stats(
    State(state): State<AppState>,
    Query(params): Query<StatsQuery>,
) -> Result<Json<HabitStats>, ApiError> {
    let raw = non_blank(params.id).ok_or_else(|| ApiError::missing("id"))?;
    let habit_id = parse_habit_id(&raw)?;
    Ok(Json(state.storage.get_stats(habit_id)?))
}
