//! Access and refresh tokens.
//!
//! An access token is a short-lived HS256 JWT scoped to one issuer/audience
//! pair. A refresh token is an opaque uuid handed to the client once; the
//! database only ever sees its SHA-256 digest.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::Error as JwtError;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;
use velvet_core::types::{DbId, Timestamp};

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Payload of an access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id.
    pub sub: DbId,
    /// `client`, `model` or `admin` at the time of issue.
    pub role: String,
    pub iss: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub access_token_expiry_mins: i64,
    pub refresh_token_expiry_days: i64,
}

impl JwtConfig {
    /// Read `JWT_*` variables.
    ///
    /// `JWT_SECRET` is required. `JWT_ISSUER` and `JWT_AUDIENCE` default to
    /// `velvet-api` and `velvet-web`; access tokens live 15 minutes and
    /// refresh tokens 7 days unless `JWT_ACCESS_EXPIRY_MINS` /
    /// `JWT_REFRESH_EXPIRY_DAYS` say otherwise.
    ///
    /// # Panics
    ///
    /// Panics on a missing or empty secret and on non-numeric lifetimes.
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET").unwrap_or_default();
        assert!(!secret.is_empty(), "JWT_SECRET must be set and non-empty");

        Self {
            secret,
            issuer: env_or("JWT_ISSUER", "velvet-api"),
            audience: env_or("JWT_AUDIENCE", "velvet-web"),
            access_token_expiry_mins: env_or("JWT_ACCESS_EXPIRY_MINS", "15")
                .parse()
                .expect("JWT_ACCESS_EXPIRY_MINS must be a whole number of minutes"),
            refresh_token_expiry_days: env_or("JWT_REFRESH_EXPIRY_DAYS", "7")
                .parse()
                .expect("JWT_REFRESH_EXPIRY_DAYS must be a whole number of days"),
        }
    }

    /// Access token lifetime, as reported to clients in `expiresIn`.
    pub fn access_ttl_secs(&self) -> i64 {
        self.access_token_expiry_mins * 60
    }

    /// Sign an access token for `user_id` acting as `role`.
    pub fn issue_access_token(&self, user_id: DbId, role: &str) -> Result<String, JwtError> {
        let iat = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id,
            role: role.to_owned(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            exp: iat + self.access_ttl_secs(),
            iat,
            jti: Uuid::new_v4().to_string(),
        };
        encode(
            &Header::new(ALGORITHM),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
    }

    /// Decode an access token, rejecting bad signatures, expiry (after the
    /// default leeway) and foreign issuers or audiences.
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(ALGORITHM);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
    }

    /// Mint a refresh token that expires after the configured number of days.
    pub fn issue_refresh_token(&self) -> RefreshToken {
        let plaintext = Uuid::new_v4().to_string();
        RefreshToken {
            hash: hash_refresh_token(&plaintext),
            plaintext,
            expires_at: Utc::now() + Duration::days(self.refresh_token_expiry_days),
        }
    }
}

/// A freshly minted refresh token. Only `hash` is persisted.
#[derive(Debug)]
pub struct RefreshToken {
    pub plaintext: String,
    pub hash: String,
    pub expires_at: Timestamp,
}

/// Hex SHA-256 of a presented refresh token, for lookup by hash.
pub fn hash_refresh_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}
