//! Debate session model, its embedded timer columns, and request DTOs.

use podium_core::timer::{SessionTimer, TimerSnapshot};
use podium_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `debate_sessions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DebateSession {
    pub id: DbId,
    pub title: String,
    pub motion: Option<String>,
    pub format: String,
    pub host_user_id: DbId,
    pub room_name: String,
    pub timer_duration_seconds: i32,
    pub timer_remaining_seconds: i32,
    pub timer_is_running: bool,
    pub timer_seq: i64,
    pub timer_updated_at: Timestamp,
    pub ended_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl DebateSession {
    /// The timer state stored on this row.
    ///
    /// The table's CHECK constraints guarantee the invariants, so a failure
    /// here means the row was written outside the repository.
    pub fn timer(&self) -> Result<SessionTimer, String> {
        SessionTimer::from_parts(
            self.timer_duration_seconds,
            self.timer_remaining_seconds,
            self.timer_is_running,
        )
    }

    /// The replicated view of the timer columns.
    pub fn timer_snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            duration_seconds: self.timer_duration_seconds,
            remaining_seconds: self.timer_remaining_seconds,
            is_running: self.timer_is_running,
            seq: self.timer_seq,
            updated_at: self.timer_updated_at,
        }
    }

    pub fn is_host(&self, user_id: DbId) -> bool {
        self.host_user_id == user_id
    }

    pub fn has_ended(&self) -> bool {
        self.ended_at.is_some()
    }
}

/// Request body for creating a debate session.
#[derive(Debug, Deserialize)]
pub struct CreateDebateSessionRequest {
    pub title: String,
    pub motion: Option<String>,
    pub format: String,
}

/// Insert DTO; the host and room name are resolved by the handler.
#[derive(Debug)]
pub struct CreateDebateSession {
    pub title: String,
    pub motion: Option<String>,
    pub format: String,
    pub host_user_id: DbId,
    pub room_name: String,
}
