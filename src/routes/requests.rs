use crate::auth::middleware::auth_middleware;
use crate::request::controller::{
    approve_request, complete_request, decline_request, list_requests, submit_request,
};
use crate::request::service::RequestService;
use axum::{
    extract::Extension,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Create a router for request routes. Every route requires authentication.
pub fn routes(request_service: Arc<RequestService>) -> Router {
    Router::new()
        .route("/api/requests", get(list_requests).post(submit_request))
        .route("/api/requests/:id/approve", post(approve_request))
        .route("/api/requests/:id/decline", post(decline_request))
        .route("/api/requests/:id/complete", post(complete_request))
        .route_layer(middleware::from_fn(auth_middleware))
        .layer(Extension(request_service))
}
