use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::listing::expiry::ExpiryStatus;

/// Closed set of food categories a listing can be tagged with.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "food_category", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum FoodCategory {
    Bread,
    Fruits,
    Vegetables,
    CookedMeals,
    Dairy,
    Desserts,
    Beverages,
    Other,
}

impl FoodCategory {
    pub const ALL: [FoodCategory; 8] = [
        FoodCategory::Bread,
        FoodCategory::Fruits,
        FoodCategory::Vegetables,
        FoodCategory::CookedMeals,
        FoodCategory::Dairy,
        FoodCategory::Desserts,
        FoodCategory::Beverages,
        FoodCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FoodCategory::Bread => "bread",
            FoodCategory::Fruits => "fruits",
            FoodCategory::Vegetables => "vegetables",
            FoodCategory::CookedMeals => "cooked-meals",
            FoodCategory::Dairy => "dairy",
            FoodCategory::Desserts => "desserts",
            FoodCategory::Beverages => "beverages",
            FoodCategory::Other => "other",
        }
    }
}

impl fmt::Display for FoodCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FoodCategory {
    type Err = ListingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase();
        FoodCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| ListingError::Validation(format!("Unknown category: {}", value)))
    }
}

/// How a donor prefers to be contacted. Only a display hint.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "contact_method", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ContactMethod {
    Phone,
    Whatsapp,
    Email,
}

impl FromStr for ContactMethod {
    type Err = ListingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "phone" => Ok(ContactMethod::Phone),
            "whatsapp" => Ok(ContactMethod::Whatsapp),
            "email" => Ok(ContactMethod::Email),
            _ => Err(ListingError::Validation(format!(
                "Unknown contact method: {}",
                value
            ))),
        }
    }
}

/// A posted food item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Listing {
    #[schema(value_type = UuidWrapper)]
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: FoodCategory,
    pub quantity: String,
    pub location: String,
    #[schema(value_type = DateTimeWrapper)]
    pub expires_at: DateTime<Utc>,
    pub pickup_instructions: Option<String>,
    pub image_url: Option<String>,
    #[schema(value_type = UuidWrapper)]
    pub donor_id: Uuid,
    pub donor_name: String,
    pub donor_contact: String,
    pub contact_method: ContactMethod,
    pub is_available: bool,
    #[schema(value_type = DateTimeWrapper)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = DateTimeWrapper)]
    pub updated_at: DateTime<Utc>,
}

/// Request body for posting a new listing.
///
/// Category and contact method arrive as plain strings so that unknown values
/// surface as validation errors rather than body rejections.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreateListingRequest {
    #[schema(example = "Fresh Bread")]
    pub title: String,
    #[schema(example = "Two baguettes from this morning")]
    pub description: String,
    #[schema(example = "bread")]
    pub category: String,
    #[schema(example = "2 loaves")]
    pub quantity: String,
    #[schema(example = "Tunis, Lafayette")]
    pub location: String,
    #[schema(value_type = DateTimeWrapper)]
    pub expires_at: DateTime<Utc>,
    pub pickup_instructions: Option<String>,
    pub image_url: Option<String>,
    #[schema(example = "Amira")]
    pub donor_name: String,
    #[schema(example = "+216 20 000 000")]
    pub donor_contact: String,
    #[schema(example = "whatsapp")]
    pub contact_method: String,
}

/// A listing that passed validation and is ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub category: FoodCategory,
    pub quantity: String,
    pub location: String,
    pub expires_at: DateTime<Utc>,
    pub pickup_instructions: Option<String>,
    pub image_url: Option<String>,
    pub donor_id: Uuid,
    pub donor_name: String,
    pub donor_contact: String,
    pub contact_method: ContactMethod,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateAvailabilityRequest {
    pub is_available: bool,
}

/// Listing as shown while browsing, with its expiry classification.
#[derive(Debug, Serialize, ToSchema)]
pub struct ListingView {
    pub listing: Listing,
    pub expiry: ExpiryStatus,
    #[schema(example = "3 hours ago")]
    pub posted: String,
    pub is_favorited: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BrowseResponse {
    pub items: Vec<ListingView>,
    pub total_count: usize,
}

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TopDonor {
    #[schema(value_type = UuidWrapper)]
    pub donor_id: Uuid,
    pub donor_name: String,
    pub total_donations: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Listing not found")]
    NotFound,

    #[error("Only the donor can modify this listing")]
    Forbidden,

    #[error("Validation error: {0}")]
    Validation(String),
}
