use crate::cache::redis::RedisCache;
use crate::listing::filter::{filter_listings, FilterCriteria};
use crate::listing::model::{
    ContactMethod, CreateListingRequest, FoodCategory, Listing, ListingError, NewListing, TopDonor,
};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

const MAX_TOP_DONORS: i64 = 50;

#[derive(Clone)]
pub struct ListingService {
    pool: PgPool,
    redis_cache: Option<RedisCache>,
}

/// Check a listing submission and normalize its text fields.
pub fn validate_new_listing(
    donor_id: Uuid,
    request: CreateListingRequest,
    now: DateTime<Utc>,
) -> Result<NewListing, ListingError> {
    let title = required("title", &request.title)?;
    let description = required("description", &request.description)?;
    let quantity = required("quantity", &request.quantity)?;
    let location = required("location", &request.location)?;
    let donor_name = required("donor_name", &request.donor_name)?;
    let donor_contact = required("donor_contact", &request.donor_contact)?;

    let category: FoodCategory = request.category.parse()?;
    let contact_method: ContactMethod = request.contact_method.parse()?;

    if request.expires_at <= now {
        return Err(ListingError::Validation(
            "Expiry date must be in the future".to_string(),
        ));
    }

    Ok(NewListing {
        title,
        description,
        category,
        quantity,
        location,
        expires_at: request.expires_at,
        pickup_instructions: optional(request.pickup_instructions),
        image_url: optional(request.image_url),
        donor_id,
        donor_name,
        donor_contact,
        contact_method,
    })
}

fn required(field: &str, value: &str) -> Result<String, ListingError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ListingError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ListingService {
    pub fn new(pool: PgPool, redis_cache: Option<RedisCache>) -> Self {
        Self { pool, redis_cache }
    }

    // Create a new listing owned by the donor
    pub async fn create_listing(
        &self,
        donor_id: Uuid,
        request: CreateListingRequest,
    ) -> Result<Listing, ListingError> {
        let now = Utc::now();
        let new_listing = validate_new_listing(donor_id, request, now)?;

        let listing = sqlx::query_as::<_, Listing>(
            r#"
            INSERT INTO marketplace.food_items (
                title, description, category, quantity, location, expires_at,
                pickup_instructions, image_url, donor_id, donor_name, donor_contact,
                contact_method, is_available, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, true, $13, $13)
            RETURNING *
            "#,
        )
        .bind(&new_listing.title)
        .bind(&new_listing.description)
        .bind(new_listing.category)
        .bind(&new_listing.quantity)
        .bind(&new_listing.location)
        .bind(new_listing.expires_at)
        .bind(&new_listing.pickup_instructions)
        .bind(&new_listing.image_url)
        .bind(new_listing.donor_id)
        .bind(&new_listing.donor_name)
        .bind(&new_listing.donor_contact)
        .bind(new_listing.contact_method)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        info!("Created listing {} for donor {}", listing.id, donor_id);
        self.invalidate_snapshot().await;

        Ok(listing)
    }

    pub async fn get_listing(&self, listing_id: Uuid) -> Result<Listing, ListingError> {
        sqlx::query_as::<_, Listing>("SELECT * FROM marketplace.food_items WHERE id = $1")
            .bind(listing_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ListingError::NotFound)
    }

    // Toggle donor-controlled availability
    pub async fn set_availability(
        &self,
        listing_id: Uuid,
        donor_id: Uuid,
        is_available: bool,
    ) -> Result<Listing, ListingError> {
        let current = self.get_listing(listing_id).await?;
        if current.donor_id != donor_id {
            warn!(
                "User {} attempted to change availability of listing {} owned by {}",
                donor_id, listing_id, current.donor_id
            );
            return Err(ListingError::Forbidden);
        }

        let listing = sqlx::query_as::<_, Listing>(
            r#"
            UPDATE marketplace.food_items
            SET is_available = $2, updated_at = $3
            WHERE id = $1 AND donor_id = $4
            RETURNING *
            "#,
        )
        .bind(listing_id)
        .bind(is_available)
        .bind(Utc::now())
        .bind(donor_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ListingError::NotFound)?;

        info!(
            "Listing {} availability set to {} by donor {}",
            listing_id, is_available, donor_id
        );
        self.invalidate_snapshot().await;

        Ok(listing)
    }

    // All available listings, newest first, served from cache when possible
    pub async fn available_listings(&self) -> Result<Vec<Listing>, ListingError> {
        // The generation is read before the query so a write that lands while
        // we are querying makes this snapshot unreachable.
        let generation = match &self.redis_cache {
            Some(cache) => match cache.listings_generation().await {
                Ok(generation) => Some(generation),
                Err(e) => {
                    warn!("Failed to read listings cache generation: {}", e);
                    None
                }
            },
            None => None,
        };

        if let (Some(cache), Some(generation)) = (&self.redis_cache, generation) {
            match cache.get_available_listings(generation).await {
                Ok(Some(listings)) => return Ok(listings),
                Ok(None) => {}
                Err(e) => warn!("Failed to read listings cache: {}", e),
            }
        }

        let listings = sqlx::query_as::<_, Listing>(
            r#"
            SELECT * FROM marketplace.food_items
            WHERE is_available = true
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        if let (Some(cache), Some(generation)) = (&self.redis_cache, generation) {
            if let Err(e) = cache.cache_available_listings(generation, &listings).await {
                warn!("Failed to cache available listings: {}", e);
            }
        }

        Ok(listings)
    }

    /// Fetch the available snapshot and apply the browse criteria in memory.
    pub async fn browse_available(
        &self,
        criteria: &FilterCriteria,
        now: DateTime<Utc>,
    ) -> Result<Vec<Listing>, ListingError> {
        let listings = self.available_listings().await?;
        let filtered = filter_listings(&listings, criteria, now)
            .into_iter()
            .cloned()
            .collect::<Vec<_>>();

        info!(
            "Browse returned {} of {} available listings",
            filtered.len(),
            listings.len()
        );
        Ok(filtered)
    }

    // Every listing a donor has posted, available or not
    pub async fn donor_listings(&self, donor_id: Uuid) -> Result<Vec<Listing>, ListingError> {
        let listings = sqlx::query_as::<_, Listing>(
            r#"
            SELECT * FROM marketplace.food_items
            WHERE donor_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(donor_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(listings)
    }

    pub async fn top_donors(&self, limit: Option<i64>) -> Result<Vec<TopDonor>, ListingError> {
        let limit = limit.unwrap_or(5).clamp(1, MAX_TOP_DONORS);

        let donors = sqlx::query_as::<_, TopDonor>(
            r#"
            SELECT donor_id, MAX(donor_name) AS donor_name, COUNT(*) AS total_donations
            FROM marketplace.food_items
            GROUP BY donor_id
            ORDER BY total_donations DESC, donor_name ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(donors)
    }

    async fn invalidate_snapshot(&self) {
        if let Some(cache) = &self.redis_cache {
            if let Err(e) = cache.invalidate_available_listings().await {
                warn!("Failed to invalidate listings cache: {}", e);
            }
        }
    }
}
