//! Event-to-WebSocket fan-out for timer changes.
//!
//! [`TimerFanout`] subscribes to the event bus and forwards every
//! `timer.updated` / `timer.expired` event to the connections subscribed to
//! that event's session. Events are published after the write commits, so
//! clients observe writes in commit order.

use std::sync::Arc;

use podium_core::event_types;
use podium_core::realtime::ServerMessage;
use podium_events::DomainEvent;
use tokio::sync::broadcast;

use crate::ws::{server_frame, WsManager};

/// Forwards timer events from the bus to session subscribers.
pub struct TimerFanout {
    ws_manager: Arc<WsManager>,
}

impl TimerFanout {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    /// Run the fan-out loop until the bus is closed.
    pub async fn run(self, mut receiver: broadcast::Receiver<DomainEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    self.deliver(&event).await;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    // Subscribers recover on the next write; seq lets them
                    // detect that they missed some.
                    tracing::warn!(skipped = n, "Timer fan-out lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, timer fan-out shutting down");
                    break;
                }
            }
        }
    }

    /// Deliver one event. Returns the number of connections reached.
    pub async fn deliver(&self, event: &DomainEvent) -> usize {
        let Some(message) = Self::to_message(event) else {
            return 0;
        };
        let Some(session_id) = message.session_id() else {
            return 0;
        };

        let frame = match server_frame(&message) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(error = %e, event_type = %event.event_type, "Failed to encode timer event");
                return 0;
            }
        };

        let count = self.ws_manager.send_to_session(session_id, frame).await;
        tracing::debug!(
            session_id,
            event_type = %event.event_type,
            recipients = count,
            "Timer event fanned out"
        );
        count
    }

    /// Map a timer event to its wire message. Non-timer events and events
    /// without a decodable snapshot yield `None`.
    fn to_message(event: &DomainEvent) -> Option<ServerMessage> {
        if !event_types::is_timer_event(&event.event_type) {
            return None;
        }
        let session_id = event.session_id?;
        let timer = event.timer_snapshot()?;

        match event.event_type.as_str() {
            event_types::TIMER_EXPIRED => Some(ServerMessage::Expired { session_id, timer }),
            _ => Some(ServerMessage::Updated { session_id, timer }),
        }
    }
}

#[cfg(test)]
mod tests {
    use podium_core::timer::TimerSnapshot;

    use super::*;

    fn snapshot(remaining: i32, seq: i64) -> TimerSnapshot {
        TimerSnapshot {
            duration_seconds: 180,
            remaining_seconds: remaining,
            is_running: false,
            seq,
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn timer_updated_maps_to_updated_message() {
        let event = DomainEvent::timer(event_types::TIMER_UPDATED, 5, &snapshot(180, 1));
        let message = TimerFanout::to_message(&event).unwrap();
        assert!(matches!(message, ServerMessage::Updated { session_id: 5, .. }));
    }

    #[test]
    fn timer_expired_maps_to_expired_message() {
        let event = DomainEvent::timer(event_types::TIMER_EXPIRED, 5, &snapshot(0, 9));
        let message = TimerFanout::to_message(&event).unwrap();
        assert!(matches!(message, ServerMessage::Expired { session_id: 5, .. }));
        assert_eq!(message.timer().unwrap().seq, 9);
    }

    #[test]
    fn non_timer_events_are_ignored() {
        let event = DomainEvent::new(event_types::SESSION_CREATED).for_session(5);
        assert!(TimerFanout::to_message(&event).is_none());
    }

    #[test]
    fn timer_event_without_session_is_ignored() {
        let event = DomainEvent::new(event_types::TIMER_UPDATED)
            .with_payload(serde_json::to_value(snapshot(10, 2)).unwrap());
        assert!(TimerFanout::to_message(&event).is_none());
    }
}
