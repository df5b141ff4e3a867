//! OpenAPI stand-ins for foreign types used in listing, request and
//! notification payloads. Referenced through `#[schema(value_type = ..)]`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// RFC 3339 timestamp, e.g. a listing's `expires_at`
#[derive(Serialize, Deserialize, ToSchema)]
#[schema(value_type = String, format = "date-time", example = "2024-03-10T18:00:00Z")]
pub struct DateTimeWrapper(pub DateTime<Utc>);

/// Identifier of a listing, request, notification or user
#[derive(Serialize, Deserialize, ToSchema)]
#[schema(value_type = String, format = "uuid", example = "5f8d2c1e-7a4b-4c39-9e61-2b7f0a3d8c45")]
pub struct UuidWrapper(pub Uuid);
