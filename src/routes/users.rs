use crate::auth::middleware::auth_middleware;
use crate::user::controller::{get_my_profile, update_my_profile};
use crate::user::service::UserService;
use axum::{extract::Extension, middleware, routing::get, Router};
use std::sync::Arc;

/// Create a router for profile routes
pub fn routes(user_service: Arc<UserService>) -> Router {
    Router::new()
        .route("/api/users/me", get(get_my_profile).put(update_my_profile))
        .route_layer(middleware::from_fn(auth_middleware))
        .layer(Extension(user_service))
}
