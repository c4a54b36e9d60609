//! Route definitions for the caller's own resources.

use axum::routing::get;
use axum::Router;

use crate::handlers::{favorites, listings};
use crate::state::AppState;

/// Routes mounted at `/me`.
///
/// ```text
/// GET /listing   -> listings::my_listing
/// GET /favorites -> favorites::list
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/listing", get(listings::my_listing))
        .route("/favorites", get(favorites::list))
}
