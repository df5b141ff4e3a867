use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error body shared by every endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ErrorResponse {
    #[schema(example = "Listing not found")]
    pub error: String,
    #[schema(example = "NOT_FOUND")]
    pub code: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, error: impl Into<String>, code: &str) -> ApiError {
    (status, Json(ErrorResponse::new(error, code)))
}

/// Response for a remote (database) failure. The cause is logged by the caller.
pub fn remote_failure() -> ApiError {
    api_error(
        StatusCode::SERVICE_UNAVAILABLE,
        "A backing service failed, please retry",
        "REMOTE_FAILURE",
    )
}
