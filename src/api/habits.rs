/// Habit endpoints: create, update, delete and the read queries

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::{non_blank, parse_habit_id, require_habit_id, ApiError, AppState, IdValue};
use crate::domain::{
    parse_all, Category, Day, Habit, HabitId, HabitUpdate, NewHabit, TimePeriod, TimeProgress,
};

/// Parameters for creating a new habit
#[derive(Debug, Deserialize)]
pub struct CreateHabitParams {
    pub desc: Option<String>,
    pub priority: Option<i64>,
    pub preferences: Option<i64>,
    #[serde(rename = "type")]
    pub habit_type: Option<String>,
    pub time: Option<String>,
    pub remarks: Option<String>,
    pub days: Option<Vec<String>>,
    pub times: Option<Vec<String>>,
}

/// Parameters for a partial update; absent fields stay as they are
#[derive(Debug, Deserialize)]
pub struct UpdateHabitParams {
    pub habit_id: Option<IdValue>,
    pub desc: Option<String>,
    pub priority: Option<i64>,
    pub preferences: Option<i64>,
    #[serde(rename = "type")]
    pub habit_type: Option<String>,
    pub time: Option<String>,
    pub remarks: Option<String>,
    pub days: Option<Vec<String>>,
    pub times: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct UpdateHabitResponse {
    pub id: HabitId,
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct HabitIdParams {
    pub habit_id: Option<IdValue>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListHabitsParams {
    #[serde(rename = "type")]
    pub habit_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ByDayParams {
    pub day: Option<String>,
    pub time: Option<String>,
}

/// Create a habit with its days and times; responds with the stored habit
pub async fn create_habit(
    State(state): State<AppState>,
    Json(params): Json<CreateHabitParams>,
) -> Result<Json<Habit>, ApiError> {
    // Empty lists count as missing
    let (Some(desc), Some(days), Some(times)) = (
        non_blank(params.desc),
        params.days.filter(|d| !d.is_empty()),
        params.times.filter(|t| !t.is_empty()),
    ) else {
        return Err(ApiError::missing("required fields: desc, days and times"));
    };

    let category = match non_blank(params.habit_type) {
        Some(raw) => raw.parse::<Category>()?,
        None => Category::Health,
    };
    let days: Vec<Day> = parse_all(&days)?;
    let times: Vec<TimePeriod> = parse_all(&times)?;

    let habit = NewHabit::new(
        desc,
        params.priority.unwrap_or(1),
        params.preferences.unwrap_or(0),
        category,
        params.time.unwrap_or_default(),
        params.remarks,
    )?
    .with_days(days)
    .with_times(times);

    let habit_id = state.storage.create_habit(&habit)?;
    tracing::info!("Created habit {} ({})", habit_id, habit.description);

    state
        .storage
        .get_habit(habit_id)?
        .map(Json)
        .ok_or_else(ApiError::habit_not_found)
}

pub async fn update_habit(
    State(state): State<AppState>,
    Json(params): Json<UpdateHabitParams>,
) -> Result<Json<UpdateHabitResponse>, ApiError> {
    let habit_id = require_habit_id(params.habit_id.as_ref())?;

    let update = HabitUpdate {
        description: params.desc,
        priority: params.priority,
        preferences: params.preferences,
        category: params.habit_type.map(|raw| raw.parse::<Category>()).transpose()?,
        time: params.time,
        remarks: params.remarks,
        days: params.days.map(|raw| parse_all::<Day>(&raw)).transpose()?,
        times: params.times.map(|raw| parse_all::<TimePeriod>(&raw)).transpose()?,
    };

    let id = state.storage.update_habit(habit_id, &update)?;
    Ok(Json(UpdateHabitResponse { id, success: true }))
}

pub async fn delete_habit(
    State(state): State<AppState>,
    Json(params): Json<HabitIdParams>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let habit_id = require_habit_id(params.habit_id.as_ref())?;
    state.storage.delete_habit(habit_id)?;
    Ok(Json(SuccessResponse { success: true }))
}

/// `GET /habits?type=`
pub async fn list_habits(
    State(state): State<AppState>,
    Query(params): Query<ListHabitsParams>,
) -> Result<Json<Vec<Habit>>, ApiError> {
    list(&state, params)
}

/// `POST /habits/list`; the body may be omitted
pub async fn list_habits_by_body(
    State(state): State<AppState>,
    params: Option<Json<ListHabitsParams>>,
) -> Result<Json<Vec<Habit>>, ApiError> {
    let params = params.map(|Json(p)| p).unwrap_or_default();
    list(&state, params)
}

fn list(state: &AppState, params: ListHabitsParams) -> Result<Json<Vec<Habit>>, ApiError> {
    let category = non_blank(params.habit_type)
        .map(|raw| raw.parse::<Category>())
        .transpose()?;
    Ok(Json(state.storage.list_habits(category)?))
}

pub async fn get_habit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Habit>, ApiError> {
    let habit_id = parse_habit_id(&id)?;
    find(&state, habit_id)
}

pub async fn get_habit_by_body(
    State(state): State<AppState>,
    Json(params): Json<HabitIdParams>,
) -> Result<Json<Habit>, ApiError> {
    let habit_id = require_habit_id(params.habit_id.as_ref())?;
    find(&state, habit_id)
}

fn find(state: &AppState, habit_id: HabitId) -> Result<Json<Habit>, ApiError> {
    state
        .storage
        .get_habit(habit_id)?
        .map(Json)
        .ok_or_else(ApiError::habit_not_found)
}

/// Per-time-period counters of one habit
pub async fn habit_progress(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<TimeProgress>>, ApiError> {
    let habit_id = parse_habit_id(&id)?;
    if state.storage.get_habit(habit_id)?.is_none() {
        return Err(ApiError::habit_not_found());
    }
    Ok(Json(state.storage.get_progress(habit_id)?))
}

/// `GET /habits/by-day?day=Monday&time=Morning`
pub async fn habits_by_day(
    State(state): State<AppState>,
    Query(params): Query<ByDayParams>,
) -> Result<Json<Vec<Habit>>, ApiError> {
    let day = non_blank(params.day)
        .ok_or_else(|| ApiError::missing("day parameter"))?
        .parse::<Day>()?;
    let time = non_blank(params.time)
        .map(|raw| raw.parse::<TimePeriod>())
        .transpose()?;

    Ok(Json(state.storage.list_habits_for_day(day, time)?))
}
