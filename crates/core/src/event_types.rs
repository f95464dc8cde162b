//! Domain event type names.
//!
//! Published on the in-process event bus and stored verbatim in the
//! `session_events.event_type` column.

pub const SESSION_CREATED: &str = "session.created";
pub const SESSION_ENDED: &str = "session.ended";
pub const PARTICIPANT_JOINED: &str = "participant.joined";
pub const PARTICIPANT_LEFT: &str = "participant.left";

/// A committed timer write. Payload: the written `TimerSnapshot`.
pub const TIMER_UPDATED: &str = "timer.updated";

/// The tick that drove the countdown to zero. Published once per expiry
/// in place of `timer.updated`; payload is the written `TimerSnapshot`.
pub const TIMER_EXPIRED: &str = "timer.expired";

/// Returns `true` for event types that are forwarded to WebSocket subscribers.
pub fn is_timer_event(event_type: &str) -> bool {
    event_type == TIMER_UPDATED || event_type == TIMER_EXPIRED
}
