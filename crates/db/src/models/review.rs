//! Review entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;
use velvet_core::rating::RatingSummary;
use velvet_core::types::{DbId, Timestamp};

/// A row from the `reviews` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: DbId,
    pub listing_id: DbId,
    pub author_id: DbId,
    pub rating: i32,
    pub text: String,
    pub created_at: Timestamp,
}

/// Request body for `POST /listings/{id}/reviews`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReview {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,
    #[serde(alias = "reviewText")]
    #[validate(length(
        min = 10,
        max = 500,
        message = "Review text must be between 10 and 500 characters"
    ))]
    pub text: String,
}

impl CreateReview {
    pub fn normalize(&mut self) {
        self.text = self.text.trim().to_string();
    }
}

/// A newly written review together with the listing's recomputed rating.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewWithSummary {
    pub review: Review,
    pub summary: RatingSummary,
}
