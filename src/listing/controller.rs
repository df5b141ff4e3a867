use crate::auth::middleware::AuthUser;
use crate::controller::{api_error, remote_failure, ApiError};
use crate::favorite::service::FavoriteService;
use crate::listing::expiry::{classify_expiry, format_time_ago};
use crate::listing::filter::{BrowseParams, FilterCriteria};
use crate::listing::model::{
    BrowseResponse, CreateListingRequest, Listing, ListingError, ListingView, TopDonor,
    UpdateAvailabilityRequest,
};
use crate::listing::service::ListingService;
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TopDonorsParams {
    /// Maximum number of donors to return
    #[schema(example = "5", default = "5", minimum = 1, maximum = 50)]
    limit: Option<i64>,
}

pub(crate) fn listing_error_to_response(err: ListingError) -> ApiError {
    match err {
        ListingError::DatabaseError(e) => {
            error!("Database error: {}", e);
            remote_failure()
        }
        ListingError::NotFound => {
            api_error(StatusCode::NOT_FOUND, "Listing not found", "NOT_FOUND")
        }
        ListingError::Forbidden => api_error(
            StatusCode::FORBIDDEN,
            "Only the donor can modify this listing",
            "FORBIDDEN",
        ),
        ListingError::Validation(msg) => {
            api_error(StatusCode::BAD_REQUEST, msg, "VALIDATION_ERROR")
        }
    }
}

fn to_view(listing: Listing, now: DateTime<Utc>, is_favorited: bool) -> ListingView {
    ListingView {
        expiry: classify_expiry(listing.expires_at, now).into(),
        posted: format_time_ago(listing.created_at, now),
        is_favorited,
        listing,
    }
}

/// Browse available listings
///
/// Applies the search, category, location and expiry filters to the available
/// listings. Expired items that are still available are returned with an
/// expired classification rather than hidden.
#[utoipa::path(
    get,
    path = "/api/listings",
    tag = "listings",
    params(BrowseParams),
    responses(
        (status = 200, description = "Matching listings", body = BrowseResponse),
        (status = 400, description = "Unknown category or expiry filter", body = ErrorResponse),
        (status = 503, description = "Database unavailable", body = ErrorResponse)
    )
)]
pub async fn browse_listings(
    Extension(user): Extension<Option<AuthUser>>,
    Extension(listing_service): Extension<Arc<ListingService>>,
    Extension(favorite_service): Extension<Arc<FavoriteService>>,
    Query(params): Query<BrowseParams>,
) -> Result<Json<BrowseResponse>, ApiError> {
    let criteria = FilterCriteria::try_from(params).map_err(listing_error_to_response)?;
    let now = Utc::now();

    let listings = listing_service
        .browse_available(&criteria, now)
        .await
        .map_err(listing_error_to_response)?;

    // Favorite flags are decoration; a failure here should not hide results.
    let favorites = match &user {
        Some(user) => favorite_service
            .favorited_ids(user.user_id)
            .await
            .unwrap_or_else(|e| {
                warn!("Failed to load favorites for {}: {}", user.user_id, e);
                HashSet::new()
            }),
        None => HashSet::new(),
    };

    let items: Vec<ListingView> = listings
        .into_iter()
        .map(|listing| {
            let is_favorited = favorites.contains(&listing.id);
            to_view(listing, now, is_favorited)
        })
        .collect();

    Ok(Json(BrowseResponse {
        total_count: items.len(),
        items,
    }))
}

/// Get a single listing
///
/// A bearer token is optional; with one, `is_favorited` reflects the caller.
#[utoipa::path(
    get,
    path = "/api/listings/{id}",
    tag = "listings",
    params(
        ("id" = String, Path, description = "Listing ID")
    ),
    responses(
        (status = 200, description = "Listing found", body = ListingView),
        (status = 404, description = "Listing not found", body = ErrorResponse)
    )
)]
pub async fn get_listing(
    Path(listing_id): Path<Uuid>,
    Extension(user): Extension<Option<AuthUser>>,
    Extension(listing_service): Extension<Arc<ListingService>>,
    Extension(favorite_service): Extension<Arc<FavoriteService>>,
) -> Result<Json<ListingView>, ApiError> {
    let listing = listing_service
        .get_listing(listing_id)
        .await
        .map_err(listing_error_to_response)?;

    let is_favorited = match &user {
        Some(user) => favorite_service
            .is_favorited(user.user_id, listing_id)
            .await
            .unwrap_or_else(|e| {
                warn!("Failed to load favorite flag for {}: {}", user.user_id, e);
                false
            }),
        None => false,
    };

    Ok(Json(to_view(listing, Utc::now(), is_favorited)))
}

/// Post a new listing
#[utoipa::path(
    post,
    path = "/api/listings",
    tag = "listings",
    request_body = CreateListingRequest,
    responses(
        (status = 201, description = "Listing created", body = Listing),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_listing(
    user: AuthUser,
    Extension(listing_service): Extension<Arc<ListingService>>,
    Json(body): Json<CreateListingRequest>,
) -> Result<(StatusCode, Json<Listing>), ApiError> {
    info!("Creating listing '{}' for donor {}", body.title, user.user_id);

    let listing = listing_service
        .create_listing(user.user_id, body)
        .await
        .map_err(listing_error_to_response)?;

    Ok((StatusCode::CREATED, Json(listing)))
}

/// List the caller's own listings
#[utoipa::path(
    get,
    path = "/api/listings/mine",
    tag = "listings",
    responses(
        (status = 200, description = "Listings posted by the caller", body = [Listing]),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn my_listings(
    user: AuthUser,
    Extension(listing_service): Extension<Arc<ListingService>>,
) -> Result<Json<Vec<Listing>>, ApiError> {
    listing_service
        .donor_listings(user.user_id)
        .await
        .map(Json)
        .map_err(listing_error_to_response)
}

/// Show or hide a listing
///
/// Only the donor who posted the listing may change its availability.
#[utoipa::path(
    patch,
    path = "/api/listings/{id}/availability",
    tag = "listings",
    params(
        ("id" = String, Path, description = "Listing ID")
    ),
    request_body = UpdateAvailabilityRequest,
    responses(
        (status = 200, description = "Availability updated", body = Listing),
        (status = 403, description = "Caller is not the donor", body = ErrorResponse),
        (status = 404, description = "Listing not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_availability(
    user: AuthUser,
    Path(listing_id): Path<Uuid>,
    Extension(listing_service): Extension<Arc<ListingService>>,
    Json(body): Json<UpdateAvailabilityRequest>,
) -> Result<Json<Listing>, ApiError> {
    listing_service
        .set_availability(listing_id, user.user_id, body.is_available)
        .await
        .map(Json)
        .map_err(listing_error_to_response)
}

/// Donors ranked by number of listings posted
#[utoipa::path(
    get,
    path = "/api/donors/top",
    tag = "listings",
    params(TopDonorsParams),
    responses(
        (status = 200, description = "Top donors", body = [TopDonor])
    )
)]
pub async fn top_donors(
    Extension(listing_service): Extension<Arc<ListingService>>,
    Query(params): Query<TopDonorsParams>,
) -> Result<Json<Vec<TopDonor>>, ApiError> {
    listing_service
        .top_donors(params.limit)
        .await
        .map(Json)
        .map_err(listing_error_to_response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::expiry::UrgencyTier;
    use crate::listing::model::{ContactMethod, FoodCategory};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    fn listing(now: DateTime<Utc>, expires_in: Duration) -> Listing {
        Listing {
            id: Uuid::new_v4(),
            title: "Oranges".to_string(),
            description: "A crate of oranges".to_string(),
            category: FoodCategory::Fruits,
            quantity: "5 kg".to_string(),
            location: "Sousse".to_string(),
            expires_at: now + expires_in,
            pickup_instructions: None,
            image_url: None,
            donor_id: Uuid::new_v4(),
            donor_name: "Donor".to_string(),
            donor_contact: "donor@example.com".to_string(),
            contact_method: ContactMethod::Email,
            is_available: true,
            created_at: now - Duration::hours(3),
            updated_at: now - Duration::hours(3),
        }
    }

    #[test]
    fn test_view_flags_expired_listing() {
        let view = to_view(listing(now(), Duration::hours(-1)), now(), false);

        assert_eq!(view.expiry.tier, UrgencyTier::Past);
        assert_eq!(view.expiry.label, "Expired");
        assert_eq!(view.posted, "3 hours ago");
        assert!(!view.is_favorited);
    }

    #[test]
    fn test_view_marks_favorites() {
        let view = to_view(listing(now(), Duration::days(2)), now(), true);
        assert!(view.is_favorited);
        assert_eq!(view.expiry.tier, UrgencyTier::Normal);
        assert_eq!(view.expiry.label, "2d left");
    }

    #[test]
    fn test_view_posted_text_uses_the_same_clock() {
        // Created exactly three hours before the reference time, however long
        // the test itself takes to run.
        let reference = now();
        let view = to_view(listing(reference, Duration::hours(5)), reference, false);
        assert_eq!(view.posted, "3 hours ago");
        assert_eq!(view.expiry.label, "5h left");
    }

    #[test]
    fn test_error_mapping() {
        let (status, body) = listing_error_to_response(ListingError::Validation(
            "title is required".to_string(),
        ));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.0.code, "VALIDATION_ERROR");
        assert_eq!(body.0.error, "title is required");

        let (status, _) = listing_error_to_response(ListingError::NotFound);
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = listing_error_to_response(ListingError::Forbidden);
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) =
            listing_error_to_response(ListingError::DatabaseError(sqlx::Error::PoolTimedOut));
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.0.code, "REMOTE_FAILURE");
    }
}
