//! Debate session participant model and DTOs.

use podium_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `debate_session_participants` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Participant {
    pub id: DbId,
    pub session_id: DbId,
    pub user_id: DbId,
    pub role: String,
    pub joined_at: Timestamp,
    pub left_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Participant {
    pub fn is_present(&self) -> bool {
        self.left_at.is_none()
    }
}

/// Request body for joining a session.
#[derive(Debug, Deserialize)]
pub struct JoinSessionRequest {
    pub role: String,
}
