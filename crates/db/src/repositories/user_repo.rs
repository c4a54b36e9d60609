//! Repository for the `users` table.

use sqlx::PgPool;
use velvet_core::types::DbId;

use crate::models::user::{CreateUser, FailedLogin, User};

const COLUMNS: &str = "id, email, password_hash, role, phone, is_verified, verification_token, \
                        reset_token, reset_token_expires, failed_login_count, locked_until, \
                        last_login_at, created_at, updated_at";

pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    ///
    /// A duplicate email fails on `uq_users_email`.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (email, password_hash, role, phone, verification_token)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(&input.role)
            .bind(&input.phone)
            .bind(&input.verification_token)
            .fetch_one(pool)
            .await
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by email. Emails are stored lowercased.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = LOWER($1)");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Count one more failed login. Reaching `max_attempts` locks the account
    /// for `lock_mins` minutes in the same statement.
    ///
    /// A lock that has already run out starts a fresh streak: the failure
    /// counts as the first of a new run and the stale `locked_until` is cleared.
    pub async fn register_failed_login(
        pool: &PgPool,
        id: DbId,
        max_attempts: i32,
        lock_mins: i32,
    ) -> Result<FailedLogin, sqlx::Error> {
        sqlx::query_as::<_, FailedLogin>(
            "UPDATE users SET
                failed_login_count = CASE
                    WHEN locked_until <= NOW() THEN 1
                    ELSE failed_login_count + 1
                END,
                locked_until = CASE
                    WHEN (CASE WHEN locked_until <= NOW() THEN 1 ELSE failed_login_count + 1 END) >= $2
                        THEN NOW() + make_interval(mins => $3)
                    WHEN locked_until <= NOW() THEN NULL
                    ELSE locked_until
                END
             WHERE id = $1
             RETURNING failed_login_count AS attempts, locked_until",
        )
        .bind(id)
        .bind(max_attempts)
        .bind(lock_mins)
        .fetch_one(pool)
        .await
    }

    /// Clear the failure streak and any lock, and stamp `last_login_at`.
    pub async fn record_successful_login(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET
                failed_login_count = 0,
                locked_until = NULL,
                last_login_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Change a user's role (used to provision admins out of band).
    pub async fn set_role(pool: &PgPool, id: DbId, role: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET role = $2 WHERE id = $1")
            .bind(id)
            .bind(role)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
