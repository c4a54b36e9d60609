//! Handlers for the `/listings` resource and the caller's own listing.

use std::collections::HashMap;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use validator::Validate;
use velvet_core::criteria::RawListingQuery;
use velvet_core::error::CoreError;
use velvet_core::listing::validate_payment_plan;
use velvet_core::pagination::PaginationMeta;
use velvet_core::types::DbId;
use velvet_db::models::listing::{
    CreateListing, Listing, ListingWithMedia, SelectPlan, UpdateListing,
};
use velvet_db::models::media::{CreateMedia, ListingMedia};
use velvet_db::repositories::{ListingRepo, MediaRepo};
use velvet_db::DbPool;

use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireModel;
use crate::response::{DataResponse, ListingPage, MyListing};
use crate::state::AppState;

/// GET /api/v1/listings
///
/// Approved listings matching the query, highest rated first. Malformed
/// numeric filters are ignored rather than rejected.
pub async fn list(
    State(state): State<AppState>,
    AppQuery(raw): AppQuery<RawListingQuery>,
) -> AppResult<Json<ListingPage>> {
    let criteria = raw.criteria();
    let page = raw.page_request();

    let (rows, total) = ListingRepo::search(&state.pool, &criteria, page).await?;
    let listings = with_media(&state.pool, rows).await?;

    Ok(Json(ListingPage {
        listings,
        pagination: PaginationMeta::new(page, total),
    }))
}

/// GET /api/v1/listings/services
///
/// Every service tag offered by an approved listing, for the search filter.
pub async fn service_tags(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<String>>>> {
    let tags = ListingRepo::service_tags(&state.pool).await?;
    Ok(Json(DataResponse { data: tags }))
}

/// GET /api/v1/listings/{id}
///
/// Only approved listings are visible here. Each hit bumps the view counter
/// in the background; a failed bump is logged and never fails the request.
pub async fn get_by_id(
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
) -> AppResult<Json<ListingWithMedia>> {
    let listing = find_listing(&state.pool, id).await?;
    if !listing.is_approved() {
        return Err(not_found(id));
    }

    let pool = state.pool.clone();
    tokio::spawn(async move {
        if let Err(e) = ListingRepo::increment_views(&pool, id).await {
            tracing::warn!(listing_id = id, error = %e, "Failed to record listing view");
        }
    });

    let media = MediaRepo::list_for_listing(&state.pool, id).await?;
    Ok(Json(ListingWithMedia { listing, media }))
}

/// POST /api/v1/listings
///
/// Create the caller's listing. It starts pending moderation.
pub async fn create(
    State(state): State<AppState>,
    RequireModel(user): RequireModel,
    AppJson(mut input): AppJson<CreateListing>,
) -> AppResult<(StatusCode, Json<ListingWithMedia>)> {
    input.normalize();
    input.validate()?;

    if ListingRepo::find_by_user(&state.pool, user.user_id)
        .await?
        .is_some()
    {
        return Err(AppError::Core(CoreError::Conflict(
            "You already have a listing".into(),
        )));
    }

    let listing = ListingRepo::create(&state.pool, user.user_id, &input).await?;
    tracing::info!(listing_id = listing.id, user_id = user.user_id, "Listing created");

    Ok((
        StatusCode::CREATED,
        Json(ListingWithMedia {
            listing,
            media: Vec::new(),
        }),
    ))
}

/// PUT /api/v1/listings/{id}
///
/// Partial update guarded by `version`. Any accepted edit sends the listing
/// back to moderation.
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<DbId>,
    AppJson(mut input): AppJson<UpdateListing>,
) -> AppResult<Json<Listing>> {
    let listing = find_listing(&state.pool, id).await?;
    ensure_can_manage(&user, &listing)?;

    input.normalize();
    input.validate()?;

    let updated = ListingRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(format!(
                "Listing {id} was modified concurrently (expected version {}). Reload and retry",
                input.version
            )))
        })?;
    tracing::info!(listing_id = id, version = updated.version, "Listing updated");
    Ok(Json(updated))
}

/// DELETE /api/v1/listings/{id}
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<DbId>,
) -> AppResult<StatusCode> {
    let listing = find_listing(&state.pool, id).await?;
    ensure_can_manage(&user, &listing)?;

    if ListingRepo::delete(&state.pool, id).await? {
        tracing::info!(listing_id = id, user_id = user.user_id, "Listing deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

/// GET /api/v1/me/listing
///
/// The caller's own listing, whatever its moderation status, with its
/// position in the public ranking once approved.
pub async fn my_listing(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<MyListing>> {
    let listing = ListingRepo::find_by_user(&state.pool, user.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Listing for user",
            id: user.user_id,
        }))?;
    let media = MediaRepo::list_for_listing(&state.pool, listing.id).await?;
    let rank = ListingRepo::rank_of(&state.pool, listing.id).await?;
    Ok(Json(MyListing {
        listing: ListingWithMedia { listing, media },
        rank,
    }))
}

/// POST /api/v1/listings/{id}/media
pub async fn add_media(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<DbId>,
    AppJson(mut input): AppJson<CreateMedia>,
) -> AppResult<(StatusCode, Json<ListingMedia>)> {
    let listing = find_listing(&state.pool, id).await?;
    ensure_can_manage(&user, &listing)?;

    input.url = input.url.trim().to_string();
    input.validate()?;

    let media = MediaRepo::create(&state.pool, id, &input).await?;
    Ok((StatusCode::CREATED, Json(media)))
}

/// DELETE /api/v1/listings/{id}/media/{media_id}
pub async fn delete_media(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath((id, media_id)): AppPath<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    let listing = find_listing(&state.pool, id).await?;
    ensure_can_manage(&user, &listing)?;

    if MediaRepo::delete(&state.pool, id, media_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "Media",
            id: media_id,
        }))
    }
}

/// PUT /api/v1/listings/{id}/plan
///
/// Select a promotion tier. The payment itself is mocked.
pub async fn select_plan(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<DbId>,
    AppJson(input): AppJson<SelectPlan>,
) -> AppResult<Json<Listing>> {
    let listing = find_listing(&state.pool, id).await?;
    ensure_can_manage(&user, &listing)?;

    let plan = input.plan.trim().to_lowercase();
    validate_payment_plan(&plan)?;

    let updated = ListingRepo::set_payment_plan(&state.pool, id, &plan)
        .await?
        .ok_or_else(|| not_found(id))?;
    tracing::info!(listing_id = id, plan = %plan, "Payment plan selected");
    Ok(Json(updated))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Listing",
        id,
    })
}

/// Load a listing regardless of status, or 404.
pub(crate) async fn find_listing(pool: &DbPool, id: DbId) -> AppResult<Listing> {
    ListingRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| not_found(id))
}

fn ensure_can_manage(user: &AuthUser, listing: &Listing) -> AppResult<()> {
    if user.can_manage(listing.user_id) {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Forbidden(
            "Only the owner or an admin can modify this listing".into(),
        )))
    }
}

/// Attach each listing's ordered media with a single query.
pub(crate) async fn with_media(
    pool: &DbPool,
    listings: Vec<Listing>,
) -> AppResult<Vec<ListingWithMedia>> {
    let ids: Vec<DbId> = listings.iter().map(|l| l.id).collect();
    let mut by_listing: HashMap<DbId, Vec<ListingMedia>> = HashMap::new();
    for media in MediaRepo::list_for_listings(pool, &ids).await? {
        by_listing.entry(media.listing_id).or_default().push(media);
    }

    Ok(listings
        .into_iter()
        .map(|listing| {
            let media = by_listing.remove(&listing.id).unwrap_or_default();
            ListingWithMedia { listing, media }
        })
        .collect())
}
