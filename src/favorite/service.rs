use crate::favorite::model::{Favorite, FavoriteError};
use crate::listing::model::Listing;
use sqlx::{PgPool, Row};
use std::collections::HashSet;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct FavoriteService {
    pool: PgPool,
}

impl FavoriteService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Adding an existing favorite is a no-op that returns the stored row
    pub async fn add_favorite(
        &self,
        user_id: Uuid,
        listing_id: Uuid,
    ) -> Result<Favorite, FavoriteError> {
        let listing_exists = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM marketplace.food_items WHERE id = $1)",
        )
        .bind(listing_id)
        .fetch_one(&self.pool)
        .await?
        .try_get::<bool, _>(0)?;

        if !listing_exists {
            return Err(FavoriteError::ListingNotFound);
        }

        sqlx::query(
            r#"
            INSERT INTO marketplace.favorites (user_id, listing_id, created_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (user_id, listing_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(listing_id)
        .execute(&self.pool)
        .await?;

        let favorite = sqlx::query_as::<_, Favorite>(
            "SELECT * FROM marketplace.favorites WHERE user_id = $1 AND listing_id = $2",
        )
        .bind(user_id)
        .bind(listing_id)
        .fetch_one(&self.pool)
        .await?;

        info!("User {} favorited listing {}", user_id, listing_id);
        Ok(favorite)
    }

    /// Returns whether a favorite was actually removed.
    pub async fn remove_favorite(
        &self,
        user_id: Uuid,
        listing_id: Uuid,
    ) -> Result<bool, FavoriteError> {
        let result = sqlx::query(
            "DELETE FROM marketplace.favorites WHERE user_id = $1 AND listing_id = $2",
        )
        .bind(user_id)
        .bind(listing_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn is_favorited(&self, user_id: Uuid, listing_id: Uuid) -> Result<bool, FavoriteError> {
        let favorited = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM marketplace.favorites WHERE user_id = $1 AND listing_id = $2)",
        )
        .bind(user_id)
        .bind(listing_id)
        .fetch_one(&self.pool)
        .await?
        .try_get::<bool, _>(0)?;

        Ok(favorited)
    }

    pub async fn favorited_ids(&self, user_id: Uuid) -> Result<HashSet<Uuid>, FavoriteError> {
        let rows = sqlx::query("SELECT listing_id FROM marketplace.favorites WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        let ids = rows
            .iter()
            .map(|row| row.try_get::<Uuid, _>("listing_id"))
            .collect::<Result<HashSet<_>, _>>()?;

        Ok(ids)
    }

    // Favorited listings, most recently saved first
    pub async fn list_favorites(&self, user_id: Uuid) -> Result<Vec<Listing>, FavoriteError> {
        let listings = sqlx::query_as::<_, Listing>(
            r#"
            SELECT i.* FROM marketplace.favorites f
            JOIN marketplace.food_items i ON i.id = f.listing_id
            WHERE f.user_id = $1
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(listings)
    }
}
