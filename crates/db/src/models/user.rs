//! Accounts of hosts, debaters, judges and observers.

use podium_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `users` table. Not `Serialize`: it carries the password
/// hash, and API responses build their own view.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub last_login_at: Option<Timestamp>,
    pub failed_login_count: i32,
    pub locked_until: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert DTO. `password_hash` is already an Argon2id PHC string.
#[derive(Debug)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
}
