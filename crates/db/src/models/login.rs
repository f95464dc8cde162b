//! Signed-in clients and their refresh tokens.

use podium_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `logins` table.
///
/// Every access token names the login it was issued under, so signing out
/// one timer client leaves the user's other clients signed in.
#[derive(Debug, Clone, FromRow)]
pub struct Login {
    pub id: DbId,
    pub user_id: DbId,
    pub refresh_token_hash: String,
    /// What signed in, e.g. `podium-timer (host)` or a browser user agent.
    pub client_label: Option<String>,
    pub expires_at: Timestamp,
    pub revoked_at: Option<Timestamp>,
    /// Last successful refresh token rotation.
    pub refreshed_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// Insert DTO for a fresh login.
pub struct CreateLogin<'a> {
    pub user_id: DbId,
    pub refresh_token_hash: &'a str,
    pub client_label: Option<&'a str>,
    pub expires_at: Timestamp,
}
