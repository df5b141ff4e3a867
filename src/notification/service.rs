use crate::notification::model::{NewNotification, Notification, NotificationError};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

const DEFAULT_NOTIFICATION_LIMIT: i64 = 20;
const MAX_NOTIFICATION_LIMIT: i64 = 100;

/// Delivers a notification to a user. Callers treat delivery as best-effort.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: NewNotification) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone)]
pub struct NotificationService {
    pool: PgPool,
}

impl NotificationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_notification(
        &self,
        payload: NewNotification,
    ) -> Result<Notification, NotificationError> {
        info!(
            "Creating {:?} notification for user {}",
            payload.severity, payload.user_id
        );

        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO marketplace.notifications (
                user_id, title, message, severity, related_id, related_type, is_read, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, false, NOW())
            RETURNING *
            "#,
        )
        .bind(payload.user_id)
        .bind(&payload.title)
        .bind(&payload.message)
        .bind(payload.severity)
        .bind(payload.related_id)
        .bind(payload.related_type)
        .fetch_one(&self.pool)
        .await?;

        Ok(notification)
    }

    // Get notifications for a user, newest first
    pub async fn get_user_notifications(
        &self,
        user_id: Uuid,
        limit: Option<i64>,
    ) -> Result<Vec<Notification>, NotificationError> {
        let limit = page_limit(limit);

        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM marketplace.notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64, NotificationError> {
        let row = sqlx::query(
            "SELECT COUNT(*) FROM marketplace.notifications WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get::<i64, _>(0)?)
    }

    // Mark notification as read; only its owner may do so
    pub async fn mark_as_read(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), NotificationError> {
        let result = sqlx::query(
            "UPDATE marketplace.notifications SET is_read = true WHERE id = $1 AND user_id = $2",
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(NotificationError::NotFound);
        }

        info!("Marked notification {} as read", notification_id);
        Ok(())
    }

    pub async fn mark_all_as_read(&self, user_id: Uuid) -> Result<u64, NotificationError> {
        let result = sqlx::query(
            "UPDATE marketplace.notifications SET is_read = true WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        info!(
            "Marked {} notifications as read for user {}",
            result.rows_affected(),
            user_id
        );
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl Notifier for NotificationService {
    async fn notify(&self, notification: NewNotification) -> Result<(), NotificationError> {
        self.create_notification(notification).await.map(|_| ())
    }
}

fn page_limit(requested: Option<i64>) -> i64 {
    requested
        .unwrap_or(DEFAULT_NOTIFICATION_LIMIT)
        .clamp(1, MAX_NOTIFICATION_LIMIT)
}
