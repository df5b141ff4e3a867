use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "notification_severity", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationSeverity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "related_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RelatedType {
    FoodRequest,
    FoodItem,
}

/// A notification that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub severity: NotificationSeverity,
    pub related_id: Option<Uuid>,
    pub related_type: Option<RelatedType>,
}

impl NewNotification {
    pub fn about_request(
        user_id: Uuid,
        request_id: Uuid,
        severity: NotificationSeverity,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            title: title.into(),
            message: message.into(),
            severity,
            related_id: Some(request_id),
            related_type: Some(RelatedType::FoodRequest),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Notification {
    #[schema(value_type = UuidWrapper)]
    pub id: Uuid,
    #[schema(value_type = UuidWrapper)]
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub severity: NotificationSeverity,
    #[schema(value_type = Option<UuidWrapper>)]
    pub related_id: Option<Uuid>,
    pub related_type: Option<RelatedType>,
    pub is_read: bool,
    #[schema(value_type = DateTimeWrapper)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NotificationListParams {
    #[schema(example = "20")]
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UnreadCountResponse {
    pub unread: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Notification not found")]
    NotFound,
}
