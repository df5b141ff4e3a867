use crate::auth::middleware::AuthUser;
use crate::controller::{api_error, remote_failure, ApiError};
use crate::request::model::{
    CreateRequestRequest, FoodRequest, RequestError, RequestListParams, RequestListResponse,
    RequestStatus,
};
use crate::request::service::RequestService;
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

// Helper function to convert RequestError to HTTP response
pub(crate) fn request_error_to_response(err: RequestError) -> ApiError {
    match err {
        RequestError::DatabaseError(e) => {
            error!("Database error: {}", e);
            remote_failure()
        }
        RequestError::NotFound => {
            api_error(StatusCode::NOT_FOUND, "Request not found", "NOT_FOUND")
        }
        RequestError::ListingNotFound => api_error(
            StatusCode::NOT_FOUND,
            "Listing not found",
            "LISTING_NOT_FOUND",
        ),
        RequestError::IllegalTransition { from, to } => api_error(
            StatusCode::CONFLICT,
            format!("A {} request cannot be {}", from, to),
            "ILLEGAL_TRANSITION",
        ),
        RequestError::Conflict => api_error(
            StatusCode::CONFLICT,
            "The request was updated by someone else, reload and try again",
            "CONFLICT",
        ),
        RequestError::Forbidden => api_error(
            StatusCode::FORBIDDEN,
            "Not authorized to perform this action",
            "FORBIDDEN",
        ),
        RequestError::Validation(msg) => {
            api_error(StatusCode::BAD_REQUEST, msg, "VALIDATION_ERROR")
        }
    }
}

/// Request a listing
///
/// Creates a pending request and notifies the donor.
#[utoipa::path(
    post,
    path = "/api/requests",
    tag = "requests",
    request_body = CreateRequestRequest,
    responses(
        (status = 201, description = "Request created", body = FoodRequest),
        (status = 400, description = "Name or contact missing", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Listing not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn submit_request(
    user: AuthUser,
    Extension(request_service): Extension<Arc<RequestService>>,
    Json(body): Json<CreateRequestRequest>,
) -> Result<(StatusCode, Json<FoodRequest>), ApiError> {
    info!(
        "User {} requesting listing {}",
        user.user_id, body.listing_id
    );

    let request = request_service
        .submit(user.user_id, body)
        .await
        .map_err(request_error_to_response)?;

    Ok((StatusCode::CREATED, Json(request)))
}

/// List the caller's requests
///
/// Returns requests the caller sent and requests received on the caller's
/// listings, newest first.
#[utoipa::path(
    get,
    path = "/api/requests",
    tag = "requests",
    params(RequestListParams),
    responses(
        (status = 200, description = "Requests", body = RequestListResponse),
        (status = 400, description = "Unknown status filter", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_requests(
    user: AuthUser,
    Extension(request_service): Extension<Arc<RequestService>>,
    Query(params): Query<RequestListParams>,
) -> Result<Json<RequestListResponse>, ApiError> {
    let status = params
        .status
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.parse::<RequestStatus>())
        .transpose()
        .map_err(request_error_to_response)?;

    request_service
        .list_for_user(user.user_id, status)
        .await
        .map(Json)
        .map_err(request_error_to_response)
}

/// Approve a pending request
#[utoipa::path(
    post,
    path = "/api/requests/{id}/approve",
    tag = "requests",
    params(
        ("id" = String, Path, description = "Request ID")
    ),
    responses(
        (status = 200, description = "Request approved", body = FoodRequest),
        (status = 403, description = "Caller is not the donor", body = ErrorResponse),
        (status = 404, description = "Request not found", body = ErrorResponse),
        (status = 409, description = "Request is not pending or changed concurrently", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn approve_request(
    user: AuthUser,
    Path(request_id): Path<Uuid>,
    Extension(request_service): Extension<Arc<RequestService>>,
) -> Result<Json<FoodRequest>, ApiError> {
    request_service
        .approve(request_id, user.user_id)
        .await
        .map(Json)
        .map_err(request_error_to_response)
}

/// Decline a pending request
#[utoipa::path(
    post,
    path = "/api/requests/{id}/decline",
    tag = "requests",
    params(
        ("id" = String, Path, description = "Request ID")
    ),
    responses(
        (status = 200, description = "Request declined", body = FoodRequest),
        (status = 403, description = "Caller is not the donor", body = ErrorResponse),
        (status = 404, description = "Request not found", body = ErrorResponse),
        (status = 409, description = "Request is not pending or changed concurrently", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn decline_request(
    user: AuthUser,
    Path(request_id): Path<Uuid>,
    Extension(request_service): Extension<Arc<RequestService>>,
) -> Result<Json<FoodRequest>, ApiError> {
    request_service
        .decline(request_id, user.user_id)
        .await
        .map(Json)
        .map_err(request_error_to_response)
}

/// Mark an approved request as completed
///
/// Either the donor or the requester may complete a request.
#[utoipa::path(
    post,
    path = "/api/requests/{id}/complete",
    tag = "requests",
    params(
        ("id" = String, Path, description = "Request ID")
    ),
    responses(
        (status = 200, description = "Request completed", body = FoodRequest),
        (status = 403, description = "Caller is not a party to the request", body = ErrorResponse),
        (status = 404, description = "Request not found", body = ErrorResponse),
        (status = 409, description = "Request is not approved or changed concurrently", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn complete_request(
    user: AuthUser,
    Path(request_id): Path<Uuid>,
    Extension(request_service): Extension<Arc<RequestService>>,
) -> Result<Json<FoodRequest>, ApiError> {
    request_service
        .complete(request_id, user.user_id)
        .await
        .map(Json)
        .map_err(request_error_to_response)
}
