//! Repository for the `debate_sessions` table and its embedded timer.

use podium_core::timer::SessionTimer;
use podium_core::types::DbId;
use sqlx::PgPool;

use crate::models::debate_session::{CreateDebateSession, DebateSession};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, title, motion, format, host_user_id, room_name, \
                        timer_duration_seconds, timer_remaining_seconds, timer_is_running, \
                        timer_seq, timer_updated_at, ended_at, created_at, updated_at";

/// Provides CRUD operations for debate sessions.
pub struct DebateSessionRepo;

impl DebateSessionRepo {
    /// Insert a new session with an idle timer, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateDebateSession,
    ) -> Result<DebateSession, sqlx::Error> {
        let query = format!(
            "INSERT INTO debate_sessions (title, motion, format, host_user_id, room_name)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DebateSession>(&query)
            .bind(&input.title)
            .bind(&input.motion)
            .bind(&input.format)
            .bind(input.host_user_id)
            .bind(&input.room_name)
            .fetch_one(pool)
            .await
    }

    /// Find a session by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<DebateSession>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM debate_sessions WHERE id = $1");
        sqlx::query_as::<_, DebateSession>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List sessions that have not ended, newest first.
    pub async fn list_active(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DebateSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM debate_sessions
             WHERE ended_at IS NULL
             ORDER BY created_at DESC, id DESC
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, DebateSession>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Persist a new timer state.
    ///
    /// The write only lands when `host_user_id` hosts the session, the
    /// session has not ended, and the stored `timer_seq` still equals
    /// `expected_seq`. With `min_spacing_ms`, it also requires that the
    /// previous timer write is at least that old, which is how ticks from
    /// a second in-sync host tab are refused. On success `timer_seq` is
    /// bumped by one and the updated row is returned; otherwise `None`.
    pub async fn write_timer(
        pool: &PgPool,
        id: DbId,
        host_user_id: DbId,
        expected_seq: i64,
        timer: &SessionTimer,
        min_spacing_ms: Option<i64>,
    ) -> Result<Option<DebateSession>, sqlx::Error> {
        let query = format!(
            "UPDATE debate_sessions SET
                timer_duration_seconds = $4,
                timer_remaining_seconds = $5,
                timer_is_running = $6,
                timer_seq = timer_seq + 1,
                timer_updated_at = NOW(),
                updated_at = NOW()
             WHERE id = $1
               AND host_user_id = $2
               AND timer_seq = $3
               AND ended_at IS NULL
               AND ($7::BIGINT IS NULL
                    OR timer_updated_at <= NOW() - $7::BIGINT * INTERVAL '1 millisecond')
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DebateSession>(&query)
            .bind(id)
            .bind(host_user_id)
            .bind(expected_seq)
            .bind(timer.duration_seconds())
            .bind(timer.remaining_seconds())
            .bind(timer.is_running())
            .bind(min_spacing_ms)
            .fetch_optional(pool)
            .await
    }

    /// End a session and stop its timer. Host only.
    ///
    /// Returns `None` when the caller is not the host or the session has
    /// already ended. Stopping a running timer counts as a timer write and
    /// bumps `timer_seq`.
    pub async fn end(
        pool: &PgPool,
        id: DbId,
        host_user_id: DbId,
    ) -> Result<Option<DebateSession>, sqlx::Error> {
        let query = format!(
            "UPDATE debate_sessions SET
                ended_at = NOW(),
                timer_seq = CASE WHEN timer_is_running THEN timer_seq + 1 ELSE timer_seq END,
                timer_updated_at = CASE WHEN timer_is_running THEN NOW() ELSE timer_updated_at END,
                timer_is_running = false,
                updated_at = NOW()
             WHERE id = $1
               AND host_user_id = $2
               AND ended_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DebateSession>(&query)
            .bind(id)
            .bind(host_user_id)
            .fetch_optional(pool)
            .await
    }
}
