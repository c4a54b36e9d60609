//! Handlers for listing reviews.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use validator::Validate;
use velvet_core::error::CoreError;
use velvet_core::types::DbId;
use velvet_db::models::review::{CreateReview, Review, ReviewWithSummary};
use velvet_db::repositories::ReviewRepo;

use super::listings::{find_listing, not_found};
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/listings/{id}/reviews
///
/// Newest first.
pub async fn list_for_listing(
    State(state): State<AppState>,
    AppPath(listing_id): AppPath<DbId>,
) -> AppResult<Json<DataResponse<Vec<Review>>>> {
    let listing = find_listing(&state.pool, listing_id).await?;
    if !listing.is_approved() {
        return Err(not_found(listing_id));
    }
    let reviews = ReviewRepo::list_for_listing(&state.pool, listing_id).await?;
    Ok(Json(DataResponse { data: reviews }))
}

/// POST /api/v1/listings/{id}/reviews
///
/// One review per author per listing. The listing's rating and review count
/// are recomputed in the same transaction as the insert.
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(listing_id): AppPath<DbId>,
    AppJson(mut input): AppJson<CreateReview>,
) -> AppResult<(StatusCode, Json<ReviewWithSummary>)> {
    input.normalize();
    input.validate()?;

    let listing = find_listing(&state.pool, listing_id).await?;
    if !listing.is_approved() {
        return Err(not_found(listing_id));
    }
    if listing.user_id == user.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "You cannot review your own listing".into(),
        )));
    }

    let (review, summary) =
        ReviewRepo::create(&state.pool, listing_id, user.user_id, &input).await?;
    tracing::info!(
        listing_id,
        review_id = review.id,
        rating = summary.rating,
        review_count = summary.review_count,
        "Review added"
    );

    Ok((StatusCode::CREATED, Json(ReviewWithSummary { review, summary })))
}

/// DELETE /api/v1/reviews/{id}
///
/// Author or admin only.
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<DbId>,
) -> AppResult<StatusCode> {
    let not_found = || {
        AppError::Core(CoreError::NotFound {
            entity: "Review",
            id,
        })
    };

    let review = ReviewRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(not_found)?;
    if !user.can_manage(review.author_id) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the author or an admin can delete this review".into(),
        )));
    }

    let summary = ReviewRepo::delete(&state.pool, review.listing_id, id)
        .await?
        .ok_or_else(not_found)?;
    tracing::info!(
        listing_id = review.listing_id,
        review_id = id,
        review_count = summary.review_count,
        "Review removed"
    );
    Ok(StatusCode::NO_CONTENT)
}
