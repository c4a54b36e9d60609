//! Refresh token model and DTOs.

use sqlx::FromRow;
use velvet_core::types::{DbId, Timestamp};

/// A row from the `refresh_tokens` table. Only the SHA-256 hash is stored.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshToken {
    pub id: DbId,
    pub user_id: DbId,
    pub token_hash: String,
    pub expires_at: Timestamp,
    pub is_revoked: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for persisting a freshly issued refresh token.
pub struct CreateRefreshToken {
    pub user_id: DbId,
    pub token_hash: String,
    pub expires_at: Timestamp,
}
