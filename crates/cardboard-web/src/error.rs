//! HTTP error responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cardboard_core::CoreError;
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    /// 400 `{message}`
    BadRequest(String),
    /// 401 `{authenticated: false}`
    Unauthorized,
    /// 500 `{message}`
    Internal(String),
    /// 500 `{error}`, used by the card listing
    Fetch(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "message": msg })),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "authenticated": false, "message": "Not authenticated" }),
            ),
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "message": msg }))
            }
            ApiError::Fetch(msg) => (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": msg })),
        };
        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidInput { message } => ApiError::BadRequest(message),
            err if err.is_client_error() => ApiError::BadRequest(err.to_string()),
            err => ApiError::Internal(err.to_string()),
        }
    }
}
