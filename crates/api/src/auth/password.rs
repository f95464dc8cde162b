//! Account passwords: the rules a new password must meet, and Argon2id
//! hashing in PHC format.
//!
//! Hashing and verification are CPU-bound, so both run on the blocking pool
//! rather than stalling the worker that also drives timer writes.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use podium_core::error::CoreError;

use crate::error::{AppError, AppResult};

/// Shortest accepted password, in characters.
pub const MIN_LEN: usize = 8;

/// Longest accepted password, in characters. Longer input only costs hashing time.
pub const MAX_LEN: usize = 128;

/// Reject a password that is too short, too long, or just the username.
pub fn check_new_password(password: &str, username: &str) -> Result<(), CoreError> {
    let len = password.chars().count();
    if len < MIN_LEN {
        return Err(CoreError::Validation(format!(
            "Password must be at least {MIN_LEN} characters long"
        )));
    }
    if len > MAX_LEN {
        return Err(CoreError::Validation(format!(
            "Password must be at most {MAX_LEN} characters long"
        )));
    }
    if password.trim().eq_ignore_ascii_case(username.trim()) {
        return Err(CoreError::Validation(
            "Password must not be the same as the username".into(),
        ));
    }
    Ok(())
}

/// Hash `password` with a fresh random salt.
pub async fn hash_password(password: String) -> AppResult<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))
    })
    .await
    .map_err(|e| AppError::InternalError(format!("Password hashing task failed: {e}")))?
}

/// `Ok(false)` on a mismatch; `Err` only when `stored` is not a valid hash.
pub async fn verify_password(password: String, stored: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&stored)
            .map_err(|e| AppError::InternalError(format!("Stored password hash is invalid: {e}")))?;
        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::InternalError(format!(
                "Password verification error: {e}"
            ))),
        }
    })
    .await
    .map_err(|e| AppError::InternalError(format!("Password verification task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[tokio::test]
    async fn hash_verifies_only_the_original_password() {
        let hash = hash_password("opening-speech".into()).await.unwrap();
        assert!(hash.starts_with("$argon2id$"));

        assert!(verify_password("opening-speech".into(), hash.clone()).await.unwrap());
        assert!(!verify_password("closing-speech".into(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn garbage_hash_is_an_internal_error() {
        let result = verify_password("anything".into(), "not-a-phc-string".into()).await;
        assert_matches!(result, Err(AppError::InternalError(_)));
    }

    #[test]
    fn length_is_counted_in_characters() {
        assert_matches!(
            check_new_password("ééééééé", "host"),
            Err(CoreError::Validation(msg)) if msg.contains("at least 8")
        );
        assert!(check_new_password("éééééééé", "host").is_ok());
        assert_matches!(
            check_new_password(&"x".repeat(MAX_LEN + 1), "host"),
            Err(CoreError::Validation(msg)) if msg.contains("at most 128")
        );
    }

    #[test]
    fn username_is_not_a_password() {
        assert!(check_new_password("Moderator", "moderator").is_err());
        assert!(check_new_password("moderator-2026", "moderator").is_ok());
    }
}
