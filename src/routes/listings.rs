use crate::auth::middleware::{auth_middleware, optional_auth_middleware};
use crate::favorite::service::FavoriteService;
use crate::listing::controller::{
    browse_listings, create_listing, get_listing, my_listings, top_donors, update_availability,
};
use crate::listing::service::ListingService;
use axum::{
    extract::Extension,
    middleware,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;

/// Create a router for listing routes
pub fn routes(
    listing_service: Arc<ListingService>,
    favorite_service: Arc<FavoriteService>,
) -> Router {
    Router::new()
        // Browsing is public; a token only adds favorite flags
        .route(
            "/api/listings",
            get(browse_listings).route_layer(middleware::from_fn(optional_auth_middleware)),
        )
        .route(
            "/api/listings",
            post(create_listing).route_layer(middleware::from_fn(auth_middleware)),
        )
        .route(
            "/api/listings/mine",
            get(my_listings).route_layer(middleware::from_fn(auth_middleware)),
        )
        .route(
            "/api/listings/:id",
            get(get_listing).route_layer(middleware::from_fn(optional_auth_middleware)),
        )
        .route(
            "/api/listings/:id/availability",
            patch(update_availability).route_layer(middleware::from_fn(auth_middleware)),
        )
        .route("/api/donors/top", get(top_donors))
        .layer(Extension(listing_service))
        .layer(Extension(favorite_service))
}
