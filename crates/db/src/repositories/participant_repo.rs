//! Repository for the `debate_session_participants` table.

use podium_core::types::DbId;
use sqlx::PgPool;

use crate::models::participant::Participant;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, session_id, user_id, role, joined_at, left_at, created_at, updated_at";

/// Provides membership operations for debate sessions.
pub struct ParticipantRepo;

impl ParticipantRepo {
    /// Add a user to a session, or re-admit them with a new role if they
    /// joined before.
    pub async fn join(
        pool: &PgPool,
        session_id: DbId,
        user_id: DbId,
        role: &str,
    ) -> Result<Participant, sqlx::Error> {
        let query = format!(
            "INSERT INTO debate_session_participants (session_id, user_id, role)
             VALUES ($1, $2, $3)
             ON CONFLICT ON CONSTRAINT uq_debate_session_participants_session_user
             DO UPDATE SET
                role = EXCLUDED.role,
                joined_at = NOW(),
                left_at = NULL,
                updated_at = NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Participant>(&query)
            .bind(session_id)
            .bind(user_id)
            .bind(role)
            .fetch_one(pool)
            .await
    }

    /// Mark a participant as having left. Returns `true` if a present
    /// participant was updated.
    pub async fn leave(pool: &PgPool, session_id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE debate_session_participants SET left_at = NOW(), updated_at = NOW()
             WHERE session_id = $1 AND user_id = $2 AND left_at IS NULL",
        )
        .bind(session_id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Find a user's membership row, present or not.
    pub async fn find(
        pool: &PgPool,
        session_id: DbId,
        user_id: DbId,
    ) -> Result<Option<Participant>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM debate_session_participants
             WHERE session_id = $1 AND user_id = $2"
        );
        sqlx::query_as::<_, Participant>(&query)
            .bind(session_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// List the participants currently present in a session, in join order.
    pub async fn list_for_session(
        pool: &PgPool,
        session_id: DbId,
    ) -> Result<Vec<Participant>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM debate_session_participants
             WHERE session_id = $1 AND left_at IS NULL
             ORDER BY joined_at ASC, id ASC"
        );
        sqlx::query_as::<_, Participant>(&query)
            .bind(session_id)
            .fetch_all(pool)
            .await
    }
}
