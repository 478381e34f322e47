use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

/// Error surface for every handler. Validation and conflict variants carry
/// enough detail for the UI to show a specific message; upstream failures
/// are logged server-side and surfaced as a generic 500.
#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    RoomFull,
    NameTaken,
    RateLimited,
    Upstream(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::RoomFull => (StatusCode::CONFLICT, "Room is full (max 10)".to_string()),
            ApiError::NameTaken => (StatusCode::CONFLICT, "Name already taken".to_string()),
            ApiError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "Rate limit reached — try again in an hour.".to_string(),
            ),
            ApiError::Upstream(err) => {
                error!("upstream failure: {err:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };
        (status, Json(json!({ "error": msg }))).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Upstream(err)
    }
}

impl ApiError {
    pub fn missing(field: &str) -> Self {
        ApiError::Validation(format!("{field} is required"))
    }
}
