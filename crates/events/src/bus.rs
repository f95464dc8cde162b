//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the central publish/subscribe hub for [`DomainEvent`]s.
//! It is shared via `Arc<EventBus>` across the application.

use chrono::{DateTime, Utc};
use podium_core::timer::TimerSnapshot;
use podium_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// DomainEvent
// ---------------------------------------------------------------------------

/// Something that happened to a debate session.
///
/// Constructed via [`DomainEvent::new`] and enriched with
/// [`for_session`](DomainEvent::for_session),
/// [`with_actor`](DomainEvent::with_actor), and
/// [`with_payload`](DomainEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Dot-separated event name, e.g. `"timer.updated"`.
    pub event_type: String,

    /// The debate session the event belongs to.
    pub session_id: Option<DbId>,

    /// The user that triggered the event, if any.
    pub actor_user_id: Option<DbId>,

    /// Event-specific data. Timer events carry a serialized [`TimerSnapshot`].
    pub payload: serde_json::Value,

    pub timestamp: DateTime<Utc>,
}

impl DomainEvent {
    /// Create a new event with only the required `event_type`.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            session_id: None,
            actor_user_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// A timer event for `session_id` carrying `snapshot` as its payload.
    pub fn timer(event_type: impl Into<String>, session_id: DbId, snapshot: &TimerSnapshot) -> Self {
        let payload = serde_json::to_value(snapshot)
            .unwrap_or_else(|_| serde_json::Value::Object(Default::default()));
        Self::new(event_type)
            .for_session(session_id)
            .with_payload(payload)
    }

    pub fn for_session(mut self, session_id: DbId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn with_actor(mut self, user_id: DbId) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Decode the timer snapshot carried by a timer event.
    pub fn timer_snapshot(&self) -> Option<TimerSnapshot> {
        serde_json::from_value(self.payload.clone()).ok()
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// ```rust
/// use podium_events::bus::{DomainEvent, EventBus};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(DomainEvent::new("session.created"));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: DomainEvent) {
        // SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use podium_core::event_types;

    fn snapshot(remaining: i32, seq: i64) -> TimerSnapshot {
        TimerSnapshot {
            duration_seconds: 60,
            remaining_seconds: remaining,
            is_running: remaining > 0,
            seq,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        let event = DomainEvent::new(event_types::SESSION_CREATED)
            .for_session(42)
            .with_actor(7)
            .with_payload(serde_json::json!({"title": "Round 1"}));

        bus.publish(event);

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.event_type, "session.created");
        assert_eq!(received.session_id, Some(42));
        assert_eq!(received.actor_user_id, Some(7));
        assert_eq!(received.payload["title"], "Round 1");
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(DomainEvent::new("multi.test"));

        let e1 = rx1.recv().await.expect("subscriber 1 should receive");
        let e2 = rx2.recv().await.expect("subscriber 2 should receive");

        assert_eq!(e1.event_type, "multi.test");
        assert_eq!(e2.event_type, "multi.test");
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(DomainEvent::new("orphan.event"));
    }

    #[test]
    fn timer_event_carries_snapshot() {
        let snap = snapshot(12, 5);
        let event = DomainEvent::timer(event_types::TIMER_UPDATED, 3, &snap);

        assert_eq!(event.session_id, Some(3));
        assert_eq!(event.payload["seq"], 5);
        assert_eq!(event.timer_snapshot(), Some(snap));
    }

    #[test]
    fn non_timer_payload_has_no_snapshot() {
        let event = DomainEvent::new(event_types::SESSION_ENDED)
            .with_payload(serde_json::json!({"reason": "host"}));
        assert!(event.timer_snapshot().is_none());
    }
}
