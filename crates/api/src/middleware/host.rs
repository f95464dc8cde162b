//! Debate session access checks.
//!
//! Timer writes are additionally guarded by the conditional UPDATE in
//! `DebateSessionRepo::write_timer`; these checks only decide which error the
//! caller sees.

use podium_core::error::CoreError;
use podium_core::types::DbId;
use podium_db::models::debate_session::DebateSession;
use podium_db::models::participant::Participant;
use podium_db::repositories::{DebateSessionRepo, ParticipantRepo};
use podium_db::DbPool;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;

/// Load a session or fail with 404.
pub async fn load_session(pool: &DbPool, session_id: DbId) -> AppResult<DebateSession> {
    DebateSessionRepo::find_by_id(pool, session_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "DebateSession",
            id: session_id,
        }))
}

/// Fail with 403 unless `user` hosts `session`.
pub fn ensure_host(session: &DebateSession, user: &AuthUser) -> AppResult<()> {
    if !session.is_host(user.user_id) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the session host can do this".into(),
        )));
    }
    Ok(())
}

/// Fail with 409 if `session` has ended.
pub fn ensure_open(session: &DebateSession) -> AppResult<()> {
    if session.has_ended() {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Session {} has ended",
            session.id
        ))));
    }
    Ok(())
}

/// Load the session and require the caller to be its host.
pub async fn require_host(
    pool: &DbPool,
    session_id: DbId,
    user: &AuthUser,
) -> AppResult<DebateSession> {
    let session = load_session(pool, session_id).await?;
    ensure_host(&session, user)?;
    Ok(session)
}

/// Require the caller to be a present participant of the session.
pub async fn require_participant(
    pool: &DbPool,
    session_id: DbId,
    user: &AuthUser,
) -> AppResult<Participant> {
    ParticipantRepo::find(pool, session_id, user.user_id)
        .await?
        .filter(Participant::is_present)
        .ok_or_else(|| {
            AppError::Core(CoreError::Forbidden(
                "You are not a participant of this session".into(),
            ))
        })
}
