use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Status of a food request.
///
/// `pending` moves to `approved` or `declined`; `approved` moves to
/// `completed`. `declined` and `completed` are terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Declined,
    Completed,
}

impl RequestStatus {
    pub fn can_transition_to(self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (RequestStatus::Pending, RequestStatus::Approved)
                | (RequestStatus::Pending, RequestStatus::Declined)
                | (RequestStatus::Approved, RequestStatus::Completed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RequestStatus::Declined | RequestStatus::Completed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Declined => "declined",
            RequestStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = RequestError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "pending" => Ok(RequestStatus::Pending),
            "approved" => Ok(RequestStatus::Approved),
            "declined" => Ok(RequestStatus::Declined),
            "completed" => Ok(RequestStatus::Completed),
            _ => Err(RequestError::Validation(format!(
                "Unknown request status: {}",
                value
            ))),
        }
    }
}

/// Database model for a request on a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct FoodRequest {
    #[schema(value_type = UuidWrapper)]
    pub id: Uuid,
    #[schema(value_type = UuidWrapper)]
    pub listing_id: Uuid,
    #[schema(value_type = UuidWrapper)]
    pub requester_id: Uuid,
    pub requester_name: String,
    pub requester_contact: String,
    pub message: Option<String>,
    pub status: RequestStatus,
    #[schema(value_type = DateTimeWrapper)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = DateTimeWrapper)]
    pub updated_at: DateTime<Utc>,
}

/// A request joined with the listing it targets.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct RequestSummary {
    #[sqlx(flatten)]
    pub request: FoodRequest,
    pub listing_title: String,
    #[schema(value_type = UuidWrapper)]
    pub donor_id: Uuid,
}

/// The parts of a listing the lifecycle needs to route notifications.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ListingOwner {
    pub listing_id: Uuid,
    pub donor_id: Uuid,
    pub title: String,
}

/// Request body for asking for a listing
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreateRequestRequest {
    #[schema(value_type = UuidWrapper)]
    pub listing_id: Uuid,
    #[schema(example = "Youssef")]
    pub requester_name: String,
    #[schema(example = "+216 50 000 000")]
    pub requester_contact: String,
    #[schema(example = "I can pick it up after 6pm")]
    pub message: Option<String>,
}

/// A validated request ready to be persisted as `pending`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFoodRequest {
    pub listing_id: Uuid,
    pub requester_id: Uuid,
    pub requester_name: String,
    pub requester_contact: String,
    pub message: Option<String>,
}

impl NewFoodRequest {
    pub fn validate(requester_id: Uuid, body: CreateRequestRequest) -> Result<Self, RequestError> {
        let requester_name = body.requester_name.trim();
        let requester_contact = body.requester_contact.trim();

        if requester_name.is_empty() || requester_contact.is_empty() {
            return Err(RequestError::Validation(
                "Name and contact are required".to_string(),
            ));
        }

        Ok(Self {
            listing_id: body.listing_id,
            requester_id,
            requester_name: requester_name.to_string(),
            requester_contact: requester_contact.to_string(),
            message: body
                .message
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty()),
        })
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RequestListParams {
    /// Only return requests in this status
    #[schema(example = "pending")]
    pub status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RequestListResponse {
    /// Requests the caller made
    pub sent: Vec<RequestSummary>,
    /// Requests on the caller's listings
    pub received: Vec<RequestSummary>,
}

/// Possible request lifecycle errors
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Request not found")]
    NotFound,

    #[error("Listing not found")]
    ListingNotFound,

    #[error("Cannot move request from {from} to {to}")]
    IllegalTransition {
        from: RequestStatus,
        to: RequestStatus,
    },

    #[error("Request was modified concurrently")]
    Conflict,

    #[error("Not authorized to perform this action")]
    Forbidden,

    #[error("Validation error: {0}")]
    Validation(String),
}
