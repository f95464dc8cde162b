//! Repository for the append-only `session_events` table.

use podium_core::types::DbId;
use sqlx::PgPool;

use crate::models::session_event::SessionEvent;

const COLUMNS: &str = "id, event_type, session_id, actor_user_id, payload, created_at";

/// Provides insert and query operations for persisted domain events.
pub struct SessionEventRepo;

impl SessionEventRepo {
    /// Insert an event, returning its ID.
    pub async fn insert(
        pool: &PgPool,
        event_type: &str,
        session_id: Option<DbId>,
        actor_user_id: Option<DbId>,
        payload: &serde_json::Value,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "INSERT INTO session_events (event_type, session_id, actor_user_id, payload)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(event_type)
        .bind(session_id)
        .bind(actor_user_id)
        .bind(payload)
        .fetch_one(pool)
        .await
    }

    /// List a session's events in the order they were recorded.
    pub async fn list_for_session(
        pool: &PgPool,
        session_id: DbId,
        limit: i64,
    ) -> Result<Vec<SessionEvent>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM session_events
             WHERE session_id = $1
             ORDER BY created_at ASC, id ASC
             LIMIT $2"
        );
        sqlx::query_as::<_, SessionEvent>(&query)
            .bind(session_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
