use crate::auth::middleware::AuthUser;
use crate::controller::{api_error, remote_failure, ApiError};
use crate::favorite::model::{Favorite, FavoriteError, FavoriteStatus};
use crate::favorite::service::FavoriteService;
use crate::listing::model::Listing;
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

fn favorite_error_to_response(err: FavoriteError) -> ApiError {
    match err {
        FavoriteError::DatabaseError(e) => {
            error!("Database error: {}", e);
            remote_failure()
        }
        FavoriteError::ListingNotFound => {
            api_error(StatusCode::NOT_FOUND, "Listing not found", "NOT_FOUND")
        }
    }
}

/// Save a listing to favorites
#[utoipa::path(
    post,
    path = "/api/favorites/{listing_id}",
    tag = "favorites",
    params(
        ("listing_id" = String, Path, description = "Listing ID")
    ),
    responses(
        (status = 200, description = "Listing is a favorite", body = Favorite),
        (status = 404, description = "Listing not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn add_favorite(
    user: AuthUser,
    Path(listing_id): Path<Uuid>,
    Extension(favorite_service): Extension<Arc<FavoriteService>>,
) -> Result<Json<Favorite>, ApiError> {
    favorite_service
        .add_favorite(user.user_id, listing_id)
        .await
        .map(Json)
        .map_err(favorite_error_to_response)
}

/// Remove a listing from favorites
#[utoipa::path(
    delete,
    path = "/api/favorites/{listing_id}",
    tag = "favorites",
    params(
        ("listing_id" = String, Path, description = "Listing ID")
    ),
    responses(
        (status = 204, description = "Listing is not a favorite")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn remove_favorite(
    user: AuthUser,
    Path(listing_id): Path<Uuid>,
    Extension(favorite_service): Extension<Arc<FavoriteService>>,
) -> Result<StatusCode, ApiError> {
    favorite_service
        .remove_favorite(user.user_id, listing_id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(favorite_error_to_response)
}

/// Check whether a listing is a favorite
#[utoipa::path(
    get,
    path = "/api/favorites/{listing_id}",
    tag = "favorites",
    params(
        ("listing_id" = String, Path, description = "Listing ID")
    ),
    responses(
        (status = 200, description = "Favorite status", body = FavoriteStatus)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn favorite_status(
    user: AuthUser,
    Path(listing_id): Path<Uuid>,
    Extension(favorite_service): Extension<Arc<FavoriteService>>,
) -> Result<Json<FavoriteStatus>, ApiError> {
    let favorited = favorite_service
        .is_favorited(user.user_id, listing_id)
        .await
        .map_err(favorite_error_to_response)?;

    Ok(Json(FavoriteStatus {
        listing_id,
        favorited,
    }))
}

/// List favorited listings
#[utoipa::path(
    get,
    path = "/api/favorites",
    tag = "favorites",
    responses(
        (status = 200, description = "Favorited listings, most recent first", body = [Listing])
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_favorites(
    user: AuthUser,
    Extension(favorite_service): Extension<Arc<FavoriteService>>,
) -> Result<Json<Vec<Listing>>, ApiError> {
    favorite_service
        .list_favorites(user.user_id)
        .await
        .map(Json)
        .map_err(favorite_error_to_response)
}
