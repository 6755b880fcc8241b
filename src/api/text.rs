/// Remark merging and profile generation endpoints

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::{non_blank, require_habit_id, ApiError, AppState, IdValue};
use crate::text;

#[derive(Debug, Deserialize)]
pub struct RemarkParams {
    pub habit_id: Option<IdValue>,
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RemarkResponse {
    pub remark: String,
}

#[derive(Debug, Deserialize)]
pub struct ProfileParams {
    pub user_data: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile: String,
}

pub async fn merge_remark(
    State(state): State<AppState>,
    Json(params): Json<RemarkParams>,
) -> Result<Json<RemarkResponse>, ApiError> {
    let habit_id = require_habit_id(params.habit_id.as_ref())?;
    let addition = non_blank(params.text).ok_or_else(|| ApiError::missing("text"))?;

    let remark =
        text::merge_remark(state.storage.as_ref(), state.merger.as_ref(), habit_id, &addition).await?;
    Ok(Json(RemarkResponse { remark }))
}

/// Summarize questionnaire answers (`user_data` must be a non-empty object)
pub async fn generate_profile(
    State(state): State<AppState>,
    Json(params): Json<ProfileParams>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let answers = params
        .user_data
        .filter(|data| data.as_object().is_some_and(|answers| !answers.is_empty()))
        .ok_or_else(|| ApiError::missing("user_data"))?;

    let profile = state.profiler.summarize(&answers).await;
    Ok(Json(ProfileResponse { profile }))
}
