use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::request::model::{
    FoodRequest, ListingOwner, NewFoodRequest, RequestStatus, RequestSummary,
};

/// Persistence collaborator for the request lifecycle.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RequestRepository: Send + Sync {
    async fn listing_owner(&self, listing_id: Uuid) -> Result<Option<ListingOwner>, sqlx::Error>;

    async fn insert(
        &self,
        request: NewFoodRequest,
        now: DateTime<Utc>,
    ) -> Result<FoodRequest, sqlx::Error>;

    async fn find(&self, request_id: Uuid) -> Result<Option<RequestSummary>, sqlx::Error>;

    /// Move `request_id` to `next` only if it is still in `expected`.
    /// Returns `None` when the precondition no longer holds.
    async fn update_status_if(
        &self,
        request_id: Uuid,
        expected: RequestStatus,
        next: RequestStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<FoodRequest>, sqlx::Error>;

    async fn list_sent(
        &self,
        requester_id: Uuid,
        status: Option<RequestStatus>,
    ) -> Result<Vec<RequestSummary>, sqlx::Error>;

    async fn list_received(
        &self,
        donor_id: Uuid,
        status: Option<RequestStatus>,
    ) -> Result<Vec<RequestSummary>, sqlx::Error>;
}

#[derive(Debug, Clone)]
pub struct PgRequestRepository {
    pool: PgPool,
}

impl PgRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SUMMARY_SELECT: &str = r#"
    SELECT r.*, i.title AS listing_title, i.donor_id
    FROM marketplace.food_requests r
    JOIN marketplace.food_items i ON i.id = r.listing_id
"#;

#[async_trait]
impl RequestRepository for PgRequestRepository {
    async fn listing_owner(&self, listing_id: Uuid) -> Result<Option<ListingOwner>, sqlx::Error> {
        sqlx::query_as::<_, ListingOwner>(
            "SELECT id AS listing_id, donor_id, title FROM marketplace.food_items WHERE id = $1",
        )
        .bind(listing_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn insert(
        &self,
        request: NewFoodRequest,
        now: DateTime<Utc>,
    ) -> Result<FoodRequest, sqlx::Error> {
        sqlx::query_as::<_, FoodRequest>(
            r#"
            INSERT INTO marketplace.food_requests (
                listing_id, requester_id, requester_name, requester_contact,
                message, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING *
            "#,
        )
        .bind(request.listing_id)
        .bind(request.requester_id)
        .bind(&request.requester_name)
        .bind(&request.requester_contact)
        .bind(&request.message)
        .bind(RequestStatus::Pending)
        .bind(now)
        .fetch_one(&self.pool)
        .await
    }

    async fn find(&self, request_id: Uuid) -> Result<Option<RequestSummary>, sqlx::Error> {
        let query = format!("{} WHERE r.id = $1", SUMMARY_SELECT);
        sqlx::query_as::<_, RequestSummary>(&query)
            .bind(request_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn update_status_if(
        &self,
        request_id: Uuid,
        expected: RequestStatus,
        next: RequestStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<FoodRequest>, sqlx::Error> {
        sqlx::query_as::<_, FoodRequest>(
            r#"
            UPDATE marketplace.food_requests
            SET status = $3, updated_at = $4
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(request_id)
        .bind(expected)
        .bind(next)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_sent(
        &self,
        requester_id: Uuid,
        status: Option<RequestStatus>,
    ) -> Result<Vec<RequestSummary>, sqlx::Error> {
        let query = format!(
            "{} WHERE r.requester_id = $1 AND ($2::request_status IS NULL OR r.status = $2) ORDER BY r.created_at DESC",
            SUMMARY_SELECT
        );
        sqlx::query_as::<_, RequestSummary>(&query)
            .bind(requester_id)
            .bind(status)
            .fetch_all(&self.pool)
            .await
    }

    async fn list_received(
        &self,
        donor_id: Uuid,
        status: Option<RequestStatus>,
    ) -> Result<Vec<RequestSummary>, sqlx::Error> {
        let query = format!(
            "{} WHERE i.donor_id = $1 AND ($2::request_status IS NULL OR r.status = $2) ORDER BY r.created_at DESC",
            SUMMARY_SELECT
        );
        sqlx::query_as::<_, RequestSummary>(&query)
            .bind(donor_id)
            .bind(status)
            .fetch_all(&self.pool)
            .await
    }
}
