mod api_doc;
mod auth;
mod cache;
mod config;
mod controller;
mod db;
mod favorite;
mod listing;
mod notification;
mod request;
mod routes;
mod schema_ext;
mod user;

use axum::{routing::get, Router};
use dotenvy::dotenv;
use redis::Client;
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api_doc::ApiDoc;
use crate::cache::redis::{RedisCache, RedisConfig};
use crate::config::AppConfig;
use crate::favorite::service::FavoriteService;
use crate::listing::service::ListingService;
use crate::notification::service::NotificationService;
use crate::request::repository::PgRequestRepository;
use crate::request::service::RequestService;
use crate::user::service::UserService;

const MAX_BIND_ATTEMPTS: u16 = 5;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if it exists
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    // Create connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;

    // Check if the database is initialized
    if !db::check_db_initialized(&pool).await {
        db::init_db(&pool).await?;
    }

    // Initialize Redis cache if configured
    let redis_cache = match &config.redis_url {
        Some(url) => match Client::open(url.as_str()) {
            Ok(client) => {
                info!("Redis cache enabled");
                Some(RedisCache::new(
                    client,
                    Some(RedisConfig {
                        listings_ttl: Some(config.listings_cache_ttl),
                    }),
                ))
            }
            Err(e) => {
                error!("Failed to connect to Redis: {}", e);
                None
            }
        },
        None => {
            info!("No Redis URL configured, proceeding without cache");
            None
        }
    };

    let listing_service = Arc::new(ListingService::new(pool.clone(), redis_cache));
    let favorite_service = Arc::new(FavoriteService::new(pool.clone()));
    let user_service = Arc::new(UserService::new(pool.clone()));
    let notification_service = Arc::new(NotificationService::new(pool.clone()));
    let request_service = Arc::new(RequestService::new(
        Arc::new(PgRequestRepository::new(pool.clone())),
        notification_service.clone(),
    ));

    // Build the router
    let app = Router::new()
        // API documentation
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(routes::health::routes(pool.clone()))
        .merge(routes::listings::routes(
            listing_service,
            favorite_service.clone(),
        ))
        .merge(routes::requests::routes(request_service))
        .merge(routes::favorites::routes(favorite_service))
        .merge(routes::notifications::routes(notification_service))
        .merge(routes::users::routes(user_service))
        .route("/", get(|| async { "Welcome to the Food Share API" }))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    // Try the configured port, then the next few
    for offset in 0..MAX_BIND_ATTEMPTS {
        let Some(port) = config.port.checked_add(offset) else {
            break;
        };
        let addr = SocketAddr::new(config.host, port);
        match axum::Server::try_bind(&addr) {
            Ok(server) => {
                info!("Server started at http://{}", addr);
                info!("API Documentation: http://{}/docs", addr);
                return server
                    .serve(app.into_make_service())
                    .await
                    .map_err(|e| e.into());
            }
            Err(e) => {
                warn!("Could not bind {}: {}", addr, e);
            }
        }
    }

    Err("Failed to bind to any port".into())
}
