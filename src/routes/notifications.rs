use crate::auth::middleware::auth_middleware;
use crate::notification::controller::{
    list_notifications, mark_all_as_read, mark_as_read, unread_count,
};
use crate::notification::service::NotificationService;
use axum::{
    extract::Extension,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Create a router for notification routes
pub fn routes(notification_service: Arc<NotificationService>) -> Router {
    Router::new()
        .route("/api/notifications", get(list_notifications))
        .route("/api/notifications/unread-count", get(unread_count))
        .route("/api/notifications/read-all", post(mark_all_as_read))
        .route("/api/notifications/:id/read", post(mark_as_read))
        .route_layer(middleware::from_fn(auth_middleware))
        .layer(Extension(notification_service))
}
