use crate::auth::middleware::auth_middleware;
use crate::favorite::controller::{add_favorite, favorite_status, list_favorites, remove_favorite};
use crate::favorite::service::FavoriteService;
use axum::{extract::Extension, middleware, routing::get, Router};
use std::sync::Arc;

/// Create a router for favorite routes
pub fn routes(favorite_service: Arc<FavoriteService>) -> Router {
    Router::new()
        .route("/api/favorites", get(list_favorites))
        .route(
            "/api/favorites/:listing_id",
            get(favorite_status)
                .post(add_favorite)
                .delete(remove_favorite),
        )
        .route_layer(middleware::from_fn(auth_middleware))
        .layer(Extension(favorite_service))
}
