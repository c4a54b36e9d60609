//! Handlers for a user's saved listings.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use velvet_core::types::DbId;
use velvet_db::models::listing::ListingWithMedia;
use velvet_db::repositories::FavoriteRepo;

use super::listings::{find_listing, not_found, with_media};
use crate::error::AppResult;
use crate::extract::AppPath;
use crate::middleware::rbac::RequireAuth;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/listings/{id}/favorite
///
/// Idempotent: saving an already saved listing is a no-op.
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    AppPath(listing_id): AppPath<DbId>,
) -> AppResult<StatusCode> {
    let listing = find_listing(&state.pool, listing_id).await?;
    if !listing.is_approved() {
        return Err(not_found(listing_id));
    }
    FavoriteRepo::add(&state.pool, user.user_id, listing_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/listings/{id}/favorite
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    AppPath(listing_id): AppPath<DbId>,
) -> AppResult<StatusCode> {
    FavoriteRepo::remove(&state.pool, user.user_id, listing_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/me/favorites
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> AppResult<Json<DataResponse<Vec<ListingWithMedia>>>> {
    let listings = FavoriteRepo::list_listings_for_user(&state.pool, user.user_id).await?;
    let data = with_media(&state.pool, listings).await?;
    Ok(Json(DataResponse { data }))
}
