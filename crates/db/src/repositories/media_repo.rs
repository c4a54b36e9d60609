//! Repository for the `listing_media` table.

use sqlx::PgPool;
use velvet_core::types::DbId;

use crate::models::media::{CreateMedia, ListingMedia};

const COLUMNS: &str = "id, listing_id, kind, url, position, created_at";

/// Provides CRUD operations for listing media.
pub struct MediaRepo;

impl MediaRepo {
    /// All media of a listing in display order.
    pub async fn list_for_listing(
        pool: &PgPool,
        listing_id: DbId,
    ) -> Result<Vec<ListingMedia>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM listing_media
             WHERE listing_id = $1
             ORDER BY position ASC, id ASC"
        );
        sqlx::query_as::<_, ListingMedia>(&query)
            .bind(listing_id)
            .fetch_all(pool)
            .await
    }

    /// Media for a page of listings in one round trip.
    pub async fn list_for_listings(
        pool: &PgPool,
        listing_ids: &[DbId],
    ) -> Result<Vec<ListingMedia>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM listing_media
             WHERE listing_id = ANY($1)
             ORDER BY listing_id, position ASC, id ASC"
        );
        sqlx::query_as::<_, ListingMedia>(&query)
            .bind(listing_ids)
            .fetch_all(pool)
            .await
    }

    /// Attach a media item. Without an explicit position it goes last.
    pub async fn create(
        pool: &PgPool,
        listing_id: DbId,
        input: &CreateMedia,
    ) -> Result<ListingMedia, sqlx::Error> {
        let query = format!(
            "INSERT INTO listing_media (listing_id, kind, url, position)
             VALUES ($1, $2, $3, COALESCE($4,
                (SELECT COALESCE(MAX(position) + 1, 0) FROM listing_media WHERE listing_id = $1)))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ListingMedia>(&query)
            .bind(listing_id)
            .bind(&input.kind)
            .bind(&input.url)
            .bind(input.position)
            .fetch_one(pool)
            .await
    }

    /// Remove a media item from a listing. Returns `true` if a row was deleted.
    pub async fn delete(
        pool: &PgPool,
        listing_id: DbId,
        media_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM listing_media WHERE id = $1 AND listing_id = $2")
            .bind(media_id)
            .bind(listing_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
