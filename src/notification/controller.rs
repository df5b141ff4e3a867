use crate::auth::middleware::AuthUser;
use crate::controller::{api_error, remote_failure, ApiError};
use crate::notification::model::{
    MarkAllReadResponse, Notification, NotificationError, NotificationListParams,
    UnreadCountResponse,
};
use crate::notification::service::NotificationService;
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

fn notification_error_to_response(err: NotificationError) -> ApiError {
    match err {
        NotificationError::DatabaseError(e) => {
            error!("Database error: {}", e);
            remote_failure()
        }
        NotificationError::NotFound => api_error(
            StatusCode::NOT_FOUND,
            "Notification not found",
            "NOT_FOUND",
        ),
    }
}

/// List the caller's notifications, newest first
#[utoipa::path(
    get,
    path = "/api/notifications",
    tag = "notifications",
    params(NotificationListParams),
    responses(
        (status = 200, description = "Notifications", body = [Notification])
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_notifications(
    user: AuthUser,
    Extension(notification_service): Extension<Arc<NotificationService>>,
    Query(params): Query<NotificationListParams>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    notification_service
        .get_user_notifications(user.user_id, params.limit)
        .await
        .map(Json)
        .map_err(notification_error_to_response)
}

/// Count unread notifications
#[utoipa::path(
    get,
    path = "/api/notifications/unread-count",
    tag = "notifications",
    responses(
        (status = 200, description = "Unread count", body = UnreadCountResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn unread_count(
    user: AuthUser,
    Extension(notification_service): Extension<Arc<NotificationService>>,
) -> Result<Json<UnreadCountResponse>, ApiError> {
    notification_service
        .unread_count(user.user_id)
        .await
        .map(|unread| Json(UnreadCountResponse { unread }))
        .map_err(notification_error_to_response)
}

/// Mark one notification as read
#[utoipa::path(
    post,
    path = "/api/notifications/{id}/read",
    tag = "notifications",
    params(
        ("id" = String, Path, description = "Notification ID")
    ),
    responses(
        (status = 204, description = "Marked as read"),
        (status = 404, description = "Notification not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn mark_as_read(
    user: AuthUser,
    Path(notification_id): Path<Uuid>,
    Extension(notification_service): Extension<Arc<NotificationService>>,
) -> Result<StatusCode, ApiError> {
    notification_service
        .mark_as_read(notification_id, user.user_id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(notification_error_to_response)
}

/// Mark every notification as read
#[utoipa::path(
    post,
    path = "/api/notifications/read-all",
    tag = "notifications",
    responses(
        (status = 200, description = "Number of notifications updated", body = MarkAllReadResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn mark_all_as_read(
    user: AuthUser,
    Extension(notification_service): Extension<Arc<NotificationService>>,
) -> Result<Json<MarkAllReadResponse>, ApiError> {
    notification_service
        .mark_all_as_read(user.user_id)
        .await
        .map(|updated| Json(MarkAllReadResponse { updated }))
        .map_err(notification_error_to_response)
}
