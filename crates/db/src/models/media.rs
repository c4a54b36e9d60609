//! Ordered media attached to a listing.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;
use velvet_core::types::{DbId, Timestamp};

use super::validation;

/// A row from the `listing_media` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingMedia {
    pub id: DbId,
    pub listing_id: DbId,
    /// `image` or `video`.
    pub kind: String,
    pub url: String,
    pub position: i32,
    pub created_at: Timestamp,
}

/// Request body for `POST /listings/{id}/media`.
///
/// When `position` is omitted the item is appended after the current last one.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMedia {
    #[validate(custom(function = validation::media_kind))]
    pub kind: String,
    #[validate(length(min = 1, max = 2048, message = "Url must be 1 to 2048 characters"))]
    pub url: String,
    #[validate(range(min = 0, message = "Position must not be negative"))]
    pub position: Option<i32>,
}
