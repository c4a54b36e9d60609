pub mod admin;
pub mod auth;
pub mod health;
pub mod listings;
pub mod me;
pub mod reviews;

use std::sync::Arc;

use axum::Router;

use crate::middleware::rate_limit::RateLimiter;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                                   register (public)
/// /auth/login                                      login (public)
/// /auth/refresh                                    refresh (public)
/// /auth/logout                                     logout (requires auth)
/// /auth/me                                         current user (requires auth)
///
/// /listings                                        search (public), create (model)
/// /listings/services                               distinct service tags (public)
/// /listings/{id}                                   get (public), update, delete (owner/admin)
/// /listings/{id}/media                             add media (owner/admin)
/// /listings/{id}/media/{media_id}                  remove media (owner/admin)
/// /listings/{id}/plan                              select payment plan (owner/admin)
/// /listings/{id}/reviews                           list (public), create (auth)
/// /listings/{id}/favorite                          save, unsave (auth)
///
/// /reviews/{id}                                    delete (author/admin)
///
/// /me/listing                                      own listing, any status (auth)
/// /me/favorites                                    saved listings (auth)
///
/// /admin/listings                                  moderation queue (admin)
/// /admin/listings/{id}/status                      set moderation status (admin)
/// ```
///
/// `auth_limiter` guards registration and login.
pub fn api_routes(auth_limiter: Arc<RateLimiter>) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router(auth_limiter))
        .nest("/listings", listings::router())
        .nest("/reviews", reviews::router())
        .nest("/me", me::router())
        .nest("/admin", admin::router())
}
