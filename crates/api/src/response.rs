//! Shared response envelope types for API handlers.
//!
//! Collections that are not paginated are returned as `{ "data": [...] }`.
//! Paginated listing searches use [`ListingPage`].

use serde::Serialize;
use velvet_core::pagination::PaginationMeta;
use velvet_db::models::listing::ListingWithMedia;

/// Standard `{ "data": T }` response envelope.
///
/// ```ignore
/// Ok(Json(DataResponse { data: reviews }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// `{ "listings": [...], "pagination": {...} }`.
#[derive(Debug, Serialize)]
pub struct ListingPage {
    pub listings: Vec<ListingWithMedia>,
    pub pagination: PaginationMeta,
}

/// The caller's own listing plus its 1-based public rank (`null` until approved).
#[derive(Debug, Serialize)]
pub struct MyListing {
    #[serde(flatten)]
    pub listing: ListingWithMedia,
    pub rank: Option<i64>,
}
