/// Mapping of failures to HTTP responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::calendar::CalendarError;
use crate::domain::DomainError;
use crate::storage::StorageError;

/// Errors a handler can return
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or malformed input (400)
    #[error("{0}")]
    Validation(String),

    /// The addressed habit or event doesn't exist (404)
    #[error("{0}")]
    NotFound(String),

    /// Anything the storage engine reports (500, logged)
    #[error(transparent)]
    Storage(StorageError),
}

impl ApiError {
    pub fn missing(field: &str) -> Self {
        ApiError::Validation(format!("Missing {}", field))
    }

    pub fn habit_not_found() -> Self {
        ApiError::NotFound("Habit not found".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::HabitNotFound { .. } => ApiError::habit_not_found(),
            StorageError::Domain(e) => ApiError::Validation(e.to_string()),
            other => ApiError::Storage(other),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        ApiError::Validation(error.to_string())
    }
}

impl From<CalendarError> for ApiError {
    fn from(error: CalendarError) -> Self {
        ApiError::Validation(error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Storage(e) => {
                // Details stay in the log
                tracing::error!("Storage failure: {}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
