use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Security scheme configuration for OpenAPI
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);

        // Tokens are issued by the hosted auth provider
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

/// API documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Food Share Backend API",
        version = "0.1.0",
        description = "REST API for sharing surplus food between donors and requesters"
    ),
    paths(
        crate::routes::health::health_check,
        crate::routes::health::protected_health_check,
        crate::listing::controller::browse_listings,
        crate::listing::controller::get_listing,
        crate::listing::controller::create_listing,
        crate::listing::controller::my_listings,
        crate::listing::controller::update_availability,
        crate::listing::controller::top_donors,
        crate::request::controller::submit_request,
        crate::request::controller::list_requests,
        crate::request::controller::approve_request,
        crate::request::controller::decline_request,
        crate::request::controller::complete_request,
        crate::favorite::controller::add_favorite,
        crate::favorite::controller::remove_favorite,
        crate::favorite::controller::favorite_status,
        crate::favorite::controller::list_favorites,
        crate::notification::controller::list_notifications,
        crate::notification::controller::unread_count,
        crate::notification::controller::mark_as_read,
        crate::notification::controller::mark_all_as_read,
        crate::user::controller::get_my_profile,
        crate::user::controller::update_my_profile
    ),
    components(
        schemas(
            crate::controller::ErrorResponse,
            crate::routes::health::HealthResponse,
            // Listing schemas
            crate::listing::model::FoodCategory,
            crate::listing::model::ContactMethod,
            crate::listing::model::Listing,
            crate::listing::model::CreateListingRequest,
            crate::listing::model::UpdateAvailabilityRequest,
            crate::listing::model::ListingView,
            crate::listing::model::BrowseResponse,
            crate::listing::model::TopDonor,
            crate::listing::expiry::ExpiryStatus,
            crate::listing::expiry::UrgencyTier,
            crate::listing::filter::ExpiryBucket,
            // Request schemas
            crate::request::model::RequestStatus,
            crate::request::model::FoodRequest,
            crate::request::model::RequestSummary,
            crate::request::model::CreateRequestRequest,
            crate::request::model::RequestListResponse,
            // Favorite schemas
            crate::favorite::model::Favorite,
            crate::favorite::model::FavoriteStatus,
            // Notification schemas
            crate::notification::model::NotificationSeverity,
            crate::notification::model::RelatedType,
            crate::notification::model::Notification,
            crate::notification::model::UnreadCountResponse,
            crate::notification::model::MarkAllReadResponse,
            // Profile schemas
            crate::user::model::UserProfile,
            crate::user::model::ProfileResponse,
            crate::user::model::UpdateProfileRequest,
            // External type schemas
            crate::schema_ext::DateTimeWrapper,
            crate::schema_ext::UuidWrapper
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "listings", description = "Food listing endpoints"),
        (name = "requests", description = "Request lifecycle endpoints"),
        (name = "favorites", description = "Saved listing endpoints"),
        (name = "notifications", description = "In-app notification endpoints"),
        (name = "users", description = "Profile endpoints")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;
