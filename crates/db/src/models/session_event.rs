//! Persisted domain event model.

use podium_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `session_events` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SessionEvent {
    pub id: DbId,
    pub event_type: String,
    pub session_id: Option<DbId>,
    pub actor_user_id: Option<DbId>,
    pub payload: serde_json::Value,
    pub created_at: Timestamp,
}
