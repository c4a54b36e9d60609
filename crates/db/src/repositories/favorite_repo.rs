//! Repository for the `favorites` table.

use sqlx::PgPool;
use velvet_core::types::DbId;

use crate::models::listing::Listing;
use crate::repositories::listing_repo::COLUMNS as LISTING_COLUMNS;

/// Provides a user's saved listings.
pub struct FavoriteRepo;

impl FavoriteRepo {
    /// Save a listing. Saving it twice is a no-op; returns `true` only when a
    /// row was inserted.
    pub async fn add(pool: &PgPool, user_id: DbId, listing_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO favorites (user_id, listing_id) VALUES ($1, $2)
             ON CONFLICT ON CONSTRAINT uq_favorites_user_listing DO NOTHING",
        )
        .bind(user_id)
        .bind(listing_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn remove(
        pool: &PgPool,
        user_id: DbId,
        listing_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND listing_id = $2")
            .bind(user_id)
            .bind(listing_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Approved listings the user saved, most recently saved first.
    pub async fn list_listings_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<Listing>, sqlx::Error> {
        let query = format!(
            "SELECT {LISTING_COLUMNS} FROM listings
             JOIN (SELECT listing_id, created_at AS saved_at FROM favorites WHERE user_id = $1) f
               ON f.listing_id = listings.id
             WHERE listings.status = 'approved'
             ORDER BY f.saved_at DESC, listings.id DESC"
        );
        sqlx::query_as::<_, Listing>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }
}
