//! Repository for the `reviews` table.
//!
//! Writes run in a transaction that locks the parent listing row, so the
//! denormalized `rating`/`review_count` on `listings` always equals the
//! aggregate of the reviews that exist once the transaction commits.

use sqlx::{PgConnection, PgPool};
use velvet_core::rating::RatingSummary;
use velvet_core::types::DbId;

use crate::models::review::{CreateReview, Review};

const COLUMNS: &str = "id, listing_id, author_id, rating, text, created_at";

/// Provides review persistence and rating recomputation.
pub struct ReviewRepo;

impl ReviewRepo {
    /// Reviews of a listing, newest first.
    pub async fn list_for_listing(
        pool: &PgPool,
        listing_id: DbId,
    ) -> Result<Vec<Review>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM reviews
             WHERE listing_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Review>(&query)
            .bind(listing_id)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Review>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reviews WHERE id = $1");
        sqlx::query_as::<_, Review>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a review and refresh the listing's rating.
    ///
    /// Fails with `RowNotFound` if the listing does not exist and on
    /// `uq_reviews_listing_author` if the author already reviewed it.
    pub async fn create(
        pool: &PgPool,
        listing_id: DbId,
        author_id: DbId,
        input: &CreateReview,
    ) -> Result<(Review, RatingSummary), sqlx::Error> {
        let mut tx = pool.begin().await?;
        lock_listing(&mut tx, listing_id).await?;

        let query = format!(
            "INSERT INTO reviews (listing_id, author_id, rating, text)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        let review = sqlx::query_as::<_, Review>(&query)
            .bind(listing_id)
            .bind(author_id)
            .bind(input.rating)
            .bind(&input.text)
            .fetch_one(&mut *tx)
            .await?;

        let summary = recompute(&mut tx, listing_id).await?;
        tx.commit().await?;
        Ok((review, summary))
    }

    /// Delete a review of `listing_id` and refresh the listing's rating.
    ///
    /// Returns `None` if no such review exists on that listing.
    pub async fn delete(
        pool: &PgPool,
        listing_id: DbId,
        review_id: DbId,
    ) -> Result<Option<RatingSummary>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        lock_listing(&mut tx, listing_id).await?;

        let result = sqlx::query("DELETE FROM reviews WHERE id = $1 AND listing_id = $2")
            .bind(review_id)
            .bind(listing_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let summary = recompute(&mut tx, listing_id).await?;
        tx.commit().await?;
        Ok(Some(summary))
    }
}

/// Serialize rating writers on the listing row.
async fn lock_listing(conn: &mut PgConnection, listing_id: DbId) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT id FROM listings WHERE id = $1 FOR UPDATE")
        .bind(listing_id)
        .fetch_one(conn)
        .await?;
    Ok(())
}

/// Recompute the aggregate from every current score and store it.
async fn recompute(conn: &mut PgConnection, listing_id: DbId) -> Result<RatingSummary, sqlx::Error> {
    let scores: Vec<(i32,)> = sqlx::query_as("SELECT rating FROM reviews WHERE listing_id = $1")
        .bind(listing_id)
        .fetch_all(&mut *conn)
        .await?;
    let summary = RatingSummary::from_scores(scores.into_iter().map(|(s,)| s));

    sqlx::query("UPDATE listings SET rating = $2, review_count = $3 WHERE id = $1")
        .bind(listing_id)
        .bind(summary.rating)
        .bind(summary.review_count)
        .execute(&mut *conn)
        .await?;
    Ok(summary)
}
