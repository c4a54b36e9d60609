//! Route definitions for listing moderation.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// GET /listings              -> moderation_queue
/// PUT /listings/{id}/status  -> set_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/listings", get(admin::moderation_queue))
        .route("/listings/{id}/status", put(admin::set_status))
}
