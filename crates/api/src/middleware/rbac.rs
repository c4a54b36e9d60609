//! Role gates layered on top of [`AuthUser`].
//!
//! A missing or invalid token is a 401 from [`AuthUser`] itself; a valid
//! token with the wrong role is a 403 from the gate.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use velvet_core::error::CoreError;
use velvet_core::roles::{ROLE_ADMIN, ROLE_MODEL};

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticate, then require the caller's role to be one of `allowed`.
async fn authorize(
    parts: &mut Parts,
    state: &AppState,
    allowed: &[&str],
    denied: &str,
) -> Result<AuthUser, AppError> {
    let user = AuthUser::from_request_parts(parts, state).await?;
    if allowed.contains(&user.role.as_str()) {
        Ok(user)
    } else {
        tracing::debug!(user_id = user.user_id, role = %user.role, "Role gate denied");
        Err(AppError::Core(CoreError::Forbidden(denied.to_owned())))
    }
}

/// Moderation endpoints.
///
/// ```ignore
/// async fn queue(RequireAdmin(admin): RequireAdmin) -> AppResult<Json<()>> { .. }
/// ```
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        authorize(parts, state, &[ROLE_ADMIN], "Admin role required")
            .await
            .map(Self)
    }
}

/// Publishing a listing. Admins pass too.
pub struct RequireModel(pub AuthUser);

impl FromRequestParts<AppState> for RequireModel {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        authorize(
            parts,
            state,
            &[ROLE_MODEL, ROLE_ADMIN],
            "Only model accounts can publish listings",
        )
        .await
        .map(Self)
    }
}

/// Any signed-in caller, whatever the role.
pub struct RequireAuth(pub AuthUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        AuthUser::from_request_parts(parts, state).await.map(Self)
    }
}
