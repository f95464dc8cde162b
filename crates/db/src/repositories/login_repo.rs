//! Repository for the `logins` table.

use podium_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::login::{CreateLogin, Login};

const COLUMNS: &str = "id, user_id, refresh_token_hash, client_label, expires_at, \
                        revoked_at, refreshed_at, created_at";

pub struct LoginRepo;

impl LoginRepo {
    pub async fn create(pool: &PgPool, input: &CreateLogin<'_>) -> Result<Login, sqlx::Error> {
        let query = format!(
            "INSERT INTO logins (user_id, refresh_token_hash, client_label, expires_at)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Login>(&query)
            .bind(input.user_id)
            .bind(input.refresh_token_hash)
            .bind(input.client_label)
            .bind(input.expires_at)
            .fetch_one(pool)
            .await
    }

    /// Swap the refresh token of a live login for a new one.
    ///
    /// Matches on the current hash in the same statement that replaces it,
    /// so a refresh token is accepted at most once even when two requests
    /// race. Returns `None` for an unknown, replaced, revoked or expired
    /// token.
    pub async fn rotate(
        pool: &PgPool,
        current_hash: &str,
        next_hash: &str,
        expires_at: Timestamp,
    ) -> Result<Option<Login>, sqlx::Error> {
        let query = format!(
            "UPDATE logins
             SET refresh_token_hash = $2, expires_at = $3, refreshed_at = NOW()
             WHERE refresh_token_hash = $1
               AND revoked_at IS NULL
               AND expires_at > NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Login>(&query)
            .bind(current_hash)
            .bind(next_hash)
            .bind(expires_at)
            .fetch_optional(pool)
            .await
    }

    /// Sign out one login owned by `user_id`. Returns `false` if it was
    /// already revoked or belongs to someone else.
    pub async fn revoke(pool: &PgPool, id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE logins SET revoked_at = NOW()
             WHERE id = $1 AND user_id = $2 AND revoked_at IS NULL",
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
