use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// A user's saved listing. One row per (user, listing) pair.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Favorite {
    #[schema(value_type = UuidWrapper)]
    pub user_id: Uuid,
    #[schema(value_type = UuidWrapper)]
    pub listing_id: Uuid,
    #[schema(value_type = DateTimeWrapper)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FavoriteStatus {
    #[schema(value_type = UuidWrapper)]
    pub listing_id: Uuid,
    pub favorited: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum FavoriteError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Listing not found")]
    ListingNotFound,
}
