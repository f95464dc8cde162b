//! WebSocket message protocol for timer change notifications.
//!
//! Messages are JSON with an internally-tagged `"type"` discriminator so
//! browser and Rust clients can route them by type string.

use serde::{Deserialize, Serialize};

use crate::timer::TimerSnapshot;
use crate::types::DbId;

/// Error code sent when a client subscribes to a session that does not exist.
pub const ERR_SESSION_NOT_FOUND: &str = "SESSION_NOT_FOUND";

/// Error code sent for frames that are not valid [`ClientMessage`]s.
pub const ERR_BAD_MESSAGE: &str = "BAD_MESSAGE";

/// Messages sent by clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Start receiving timer notifications for a session.
    #[serde(rename = "timer.subscribe")]
    Subscribe { session_id: DbId },

    /// Stop receiving timer notifications for a session.
    #[serde(rename = "timer.unsubscribe")]
    Unsubscribe { session_id: DbId },
}

/// Messages pushed by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Current state, sent once in reply to a subscribe.
    #[serde(rename = "timer.snapshot")]
    Snapshot {
        session_id: DbId,
        timer: TimerSnapshot,
    },

    /// A committed timer write.
    #[serde(rename = "timer.updated")]
    Updated {
        session_id: DbId,
        timer: TimerSnapshot,
    },

    /// The countdown reached zero. `timer` is the state written by the
    /// expiring tick.
    #[serde(rename = "timer.expired")]
    Expired {
        session_id: DbId,
        timer: TimerSnapshot,
    },

    #[serde(rename = "error")]
    Error { code: String, message: String },
}

impl ServerMessage {
    /// The session a timer message refers to, if any.
    pub fn session_id(&self) -> Option<DbId> {
        match self {
            ServerMessage::Snapshot { session_id, .. }
            | ServerMessage::Updated { session_id, .. }
            | ServerMessage::Expired { session_id, .. } => Some(*session_id),
            ServerMessage::Error { .. } => None,
        }
    }

    /// The timer snapshot carried by a timer message, if any.
    pub fn timer(&self) -> Option<&TimerSnapshot> {
        match self {
            ServerMessage::Snapshot { timer, .. }
            | ServerMessage::Updated { timer, .. }
            | ServerMessage::Expired { timer, .. } => Some(timer),
            ServerMessage::Error { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::{SessionTimer, TimerCommand};

    fn snapshot() -> TimerSnapshot {
        let timer = SessionTimer::new()
            .apply(TimerCommand::Set {
                minutes: 3,
                seconds: 0,
            })
            .unwrap()
            .timer;
        TimerSnapshot::new(timer, 1, chrono::Utc::now())
    }

    #[test]
    fn subscribe_parses_from_tagged_json() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"timer.subscribe","session_id":12}"#).unwrap();
        assert_eq!(msg, ClientMessage::Subscribe { session_id: 12 });
    }

    #[test]
    fn unknown_type_is_rejected() {
        let result = serde_json::from_str::<ClientMessage>(r#"{"type":"timer.start"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn updated_message_carries_type_and_timer() {
        let msg = ServerMessage::Updated {
            session_id: 4,
            timer: snapshot(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "timer.updated");
        assert_eq!(json["session_id"], 4);
        assert_eq!(json["timer"]["remaining_seconds"], 180);
        assert_eq!(msg.session_id(), Some(4));
    }

    #[test]
    fn error_message_has_no_session() {
        let msg = ServerMessage::Error {
            code: ERR_BAD_MESSAGE.into(),
            message: "nope".into(),
        };
        assert_eq!(msg.session_id(), None);
        assert!(msg.timer().is_none());
    }
}
