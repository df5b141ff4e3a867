use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Name given to a profile created before the user has picked one.
pub const DEFAULT_DISPLAY_NAME: &str = "Anonymous User";

/// Marketplace profile. The row id is the auth provider's user id.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserProfile {
    #[schema(value_type = UuidWrapper)]
    pub id: Uuid,
    #[schema(example = "amira@example.com")]
    pub email: Option<String>,
    #[schema(example = "Amira")]
    pub name: String,
    #[schema(example = "+216 20 123 456")]
    pub whatsapp_number: Option<String>,
    #[schema(value_type = DateTimeWrapper)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = DateTimeWrapper)]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, FromRow)]
pub struct DonationStats {
    pub total_donations: i64,
    pub active_listings: i64,
}

/// Profile with the donation counts shown on the profile page.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub profile: UserProfile,
    /// Listings this user has ever posted
    pub total_donations: i64,
    /// Posted listings that are still available and not expired
    pub active_listings: i64,
}

impl ProfileResponse {
    pub fn new(profile: UserProfile, stats: DonationStats) -> Self {
        Self {
            profile,
            total_donations: stats.total_donations,
            active_listings: stats.active_listings,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    #[schema(example = "Amira")]
    pub name: String,
    /// Empty or missing clears the number
    #[schema(example = "+216 20 123 456")]
    pub whatsapp_number: Option<String>,
}

/// Profile fields after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: String,
    pub whatsapp_number: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("{0}")]
    Validation(String),
}
