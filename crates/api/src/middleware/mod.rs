//! Request extractors and response middleware.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.
//! - [`rbac::RequireAdmin`] -- Requires the `admin` role.
//! - [`rbac::RequireModel`] -- Requires `model` or `admin` role.
//! - [`rbac::RequireAuth`] -- Requires any authenticated user.
//! - [`error_detail`] -- Exposes masked internal error details in development.
//! - [`rate_limit`] -- Per-client request quotas (429).

pub mod auth;
pub mod error_detail;
pub mod rate_limit;
pub mod rbac;
