use crate::auth::middleware::AuthUser;
use crate::controller::{api_error, remote_failure, ApiError};
use crate::user::model::{ProfileResponse, UpdateProfileRequest, UserError};
use crate::user::service::UserService;
use axum::{extract::Extension, http::StatusCode, Json};
use std::sync::Arc;
use tracing::error;

fn user_error_to_response(err: UserError) -> ApiError {
    match err {
        UserError::DatabaseError(e) => {
            error!("Database error: {}", e);
            remote_failure()
        }
        UserError::Validation(msg) => api_error(StatusCode::BAD_REQUEST, msg, "VALIDATION_ERROR"),
    }
}

/// Get the caller's profile
///
/// The profile is created with a default name on first access.
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "users",
    responses(
        (status = 200, description = "Profile with donation counts", body = ProfileResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_my_profile(
    user: AuthUser,
    Extension(user_service): Extension<Arc<UserService>>,
) -> Result<Json<ProfileResponse>, ApiError> {
    user_service
        .get_or_create_profile(&user)
        .await
        .map(Json)
        .map_err(user_error_to_response)
}

/// Update the caller's name and WhatsApp number
#[utoipa::path(
    put,
    path = "/api/users/me",
    tag = "users",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = ProfileResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_my_profile(
    user: AuthUser,
    Extension(user_service): Extension<Arc<UserService>>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    user_service
        .update_profile(&user, body)
        .await
        .map(Json)
        .map_err(user_error_to_response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping() {
        let (status, Json(body)) =
            user_error_to_response(UserError::Validation("name is required".to_string()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "VALIDATION_ERROR");
        assert_eq!(body.error, "name is required");

        let (status, Json(body)) =
            user_error_to_response(UserError::DatabaseError(sqlx::Error::PoolTimedOut));
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.code, "REMOTE_FAILURE");
    }
}
