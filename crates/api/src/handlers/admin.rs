//! Admin moderation handlers.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use velvet_core::listing::ModerationStatus;
use velvet_core::pagination::{PageRequest, PaginationMeta};
use velvet_core::types::DbId;
use velvet_db::models::listing::{Listing, SetStatus};
use velvet_db::repositories::ListingRepo;

use super::listings::{not_found, with_media};
use crate::error::AppResult;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::middleware::rbac::RequireAdmin;
use crate::response::ListingPage;
use crate::state::AppState;

/// Query parameters for `GET /admin/listings`.
///
/// `status` defaults to `pending`; `all` lists every status.
#[derive(Debug, Default, Deserialize)]
pub struct ModerationQuery {
    pub status: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ModerationQuery {
    fn status_filter(&self) -> AppResult<Option<ModerationStatus>> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(Some(ModerationStatus::Pending)),
            Some("all") => Ok(None),
            Some(other) => Ok(Some(other.parse()?)),
        }
    }

    fn page_request(&self) -> PageRequest {
        let number = |v: &Option<String>| v.as_deref().and_then(|s| s.trim().parse().ok());
        PageRequest::new(number(&self.page), number(&self.limit))
    }
}

/// GET /api/v1/admin/listings
///
/// Moderation queue, oldest first.
pub async fn moderation_queue(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    AppQuery(query): AppQuery<ModerationQuery>,
) -> AppResult<Json<ListingPage>> {
    let status = query.status_filter()?;
    let page = query.page_request();

    let (rows, total) = ListingRepo::list_by_status(&state.pool, status, page).await?;
    let listings = with_media(&state.pool, rows).await?;

    Ok(Json(ListingPage {
        listings,
        pagination: PaginationMeta::new(page, total),
    }))
}

/// PUT /api/v1/admin/listings/{id}/status
pub async fn set_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    AppPath(id): AppPath<DbId>,
    AppJson(input): AppJson<SetStatus>,
) -> AppResult<Json<Listing>> {
    let status: ModerationStatus = input.status.trim().parse()?;

    let listing = ListingRepo::set_status(&state.pool, id, status)
        .await?
        .ok_or_else(|| not_found(id))?;
    tracing::info!(listing_id = id, admin_id = admin.user_id, status = %status, "Listing moderated");
    Ok(Json(listing))
}
