//! Route definitions for the `/listings` resource.
//!
//! Reviews, media, plan selection and favorites nest under
//! `/listings/{id}/...`.

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::{favorites, listings, reviews};
use crate::state::AppState;

/// Routes mounted at `/listings`.
///
/// ```text
/// GET    /                          -> list
/// POST   /                          -> create
/// GET    /services                  -> service_tags
/// GET    /{id}                      -> get_by_id
/// PUT    /{id}                      -> update
/// DELETE /{id}                      -> delete
///
/// POST   /{id}/media                -> add_media
/// DELETE /{id}/media/{media_id}     -> delete_media
/// PUT    /{id}/plan                 -> select_plan
///
/// GET    /{id}/reviews              -> reviews::list_for_listing
/// POST   /{id}/reviews              -> reviews::create
///
/// POST   /{id}/favorite             -> favorites::add
/// DELETE /{id}/favorite             -> favorites::remove
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(listings::list).post(listings::create))
        .route("/services", get(listings::service_tags))
        .route(
            "/{id}",
            get(listings::get_by_id)
                .put(listings::update)
                .delete(listings::delete),
        )
        .route("/{id}/media", post(listings::add_media))
        .route("/{id}/media/{media_id}", delete(listings::delete_media))
        .route("/{id}/plan", put(listings::select_plan))
        .route(
            "/{id}/reviews",
            get(reviews::list_for_listing).post(reviews::create),
        )
        .route(
            "/{id}/favorite",
            post(favorites::add).delete(favorites::remove),
        )
}
