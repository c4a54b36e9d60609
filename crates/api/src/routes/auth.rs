//! Route definitions for the `/auth` resource.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::middleware::rate_limit::{self, RateLimiter};
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /register -> register
/// POST /login    -> login
/// POST /refresh  -> refresh
/// POST /logout   -> logout (requires auth)
/// GET  /me       -> me (requires auth)
/// ```
///
/// Failed registrations and logins count against `limiter`.
pub fn router(limiter: Arc<RateLimiter>) -> Router<AppState> {
    let guarded = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route_layer(axum::middleware::from_fn_with_state(
            limiter,
            rate_limit::enforce,
        ));

    Router::new()
        .merge(guarded)
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}
