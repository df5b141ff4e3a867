use axum::{
    async_trait,
    extract::FromRequestParts,
    headers::{authorization::Bearer, Authorization},
    http::{request::Parts, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
    RequestPartsExt, TypedHeader,
};
use tracing::{debug, error};
use uuid::Uuid;

use super::jwt::{validate_token, Claims, JwtError};
use crate::controller::ErrorResponse;

/// Authenticated user information
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: Option<String>,
}

impl TryFrom<Claims> for AuthUser {
    type Error = JwtError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| JwtError::InvalidToken)?;
        Ok(Self {
            user_id,
            email: claims.email,
        })
    }
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new(message, "UNAUTHORIZED")),
    )
        .into_response()
}

async fn authenticate(parts: &mut Parts) -> Result<AuthUser, Response> {
    let TypedHeader(Authorization(bearer)) = parts
        .extract::<TypedHeader<Authorization<Bearer>>>()
        .await
        .map_err(|e| {
            debug!("Authorization header extraction failed: {:?}", e);
            unauthorized("Missing or invalid Authorization header. Please provide a Bearer token")
        })?;

    validate_token(bearer.token())
        .and_then(AuthUser::try_from)
        .map_err(|e| {
            error!("Token validation failed: {}", e);
            match StatusCode::from(e) {
                StatusCode::UNAUTHORIZED => unauthorized("Invalid token. Please sign in again"),
                status => (
                    status,
                    Json(ErrorResponse::new(
                        "Authentication is not configured",
                        "AUTH_UNAVAILABLE",
                    )),
                )
                    .into_response(),
            }
        })
}

/// Authentication middleware to protect routes
pub async fn auth_middleware<B>(req: Request<B>, next: Next<B>) -> Result<Response, Response> {
    let (mut parts, body) = req.into_parts();

    let auth_user = authenticate(&mut parts).await?;
    debug!("User authenticated: {}", auth_user.user_id);

    parts.extensions.insert(auth_user);

    let req = Request::from_parts(parts, body);
    Ok(next.run(req).await)
}

/// Optional authentication for public routes that personalize their output.
/// Always inserts an `Option<AuthUser>` extension.
pub async fn optional_auth_middleware<B>(req: Request<B>, next: Next<B>) -> Response {
    let (mut parts, body) = req.into_parts();

    let auth_user = authenticate(&mut parts).await.ok();
    parts.extensions.insert(auth_user);

    let req = Request::from_parts(parts, body);
    next.run(req).await
}

/// Extractor for authenticated user
#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| unauthorized("Authentication required"))
    }
}
