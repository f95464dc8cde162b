//! In-memory [`TimerApi`] for solo practice and tests.
//!
//! Mirrors the server's write path: commands go through
//! [`SessionTimer::apply`], no-ops are not written, every committed write
//! bumps `seq`, and a tick is rejected with a 409 when its `expected_seq`
//! is stale or it lands within the minimum tick spacing of the previous
//! write. Committed writes are also broadcast as [`ServerMessage`]s so a
//! display can be driven the same way the WebSocket subscriber drives it.

use std::sync::Mutex;

use async_trait::async_trait;
use podium_core::realtime::ServerMessage;
use podium_core::timer::{SessionTimer, TimerCommand, TimerSnapshot, MIN_TICK_SPACING};
use podium_core::types::{DbId, Timestamp};
use tokio::sync::broadcast;
use tokio::time::Instant;

use crate::api::TimerApi;
use crate::error::ClientError;

const NOTIFY_CAPACITY: usize = 64;

struct LocalState {
    timer: SessionTimer,
    seq: i64,
    updated_at: Timestamp,
    last_write: Instant,
}

impl LocalState {
    fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot::new(self.timer, self.seq, self.updated_at)
    }
}

pub struct LocalTimerApi {
    session_id: DbId,
    state: Mutex<LocalState>,
    notify: broadcast::Sender<ServerMessage>,
}

impl LocalTimerApi {
    pub fn new(session_id: DbId) -> Self {
        let (notify, _) = broadcast::channel(NOTIFY_CAPACITY);
        Self {
            session_id,
            state: Mutex::new(LocalState {
                timer: SessionTimer::new(),
                seq: 0,
                updated_at: chrono::Utc::now(),
                last_write: Instant::now(),
            }),
            notify,
        }
    }

    /// Receive a message for every committed write.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.notify.subscribe()
    }

    fn apply(
        &self,
        command: TimerCommand,
        expected_seq: Option<i64>,
    ) -> Result<TimerSnapshot, ClientError> {
        let (snapshot, expired) = {
            let mut state = self
                .state
                .lock()
                .map_err(|_| ClientError::Protocol("Local timer state is poisoned".into()))?;

            if let Some(expected) = expected_seq {
                if expected != state.seq {
                    return Err(ClientError::Status {
                        status: 409,
                        code: Some("CONFLICT".into()),
                        message: format!(
                            "Timer is at seq {}, request expected {expected}",
                            state.seq
                        ),
                    });
                }
            }

            let transition = state.timer.apply(command)?;
            if !transition.changed {
                return Ok(state.snapshot());
            }

            if command == TimerCommand::Tick
                && state.last_write.elapsed() < MIN_TICK_SPACING
            {
                return Err(ClientError::Status {
                    status: 409,
                    code: Some("CONFLICT".into()),
                    message: "Tick arrived too soon after the previous timer write".into(),
                });
            }

            state.timer = transition.timer;
            state.seq += 1;
            state.updated_at = chrono::Utc::now();
            state.last_write = Instant::now();
            (state.snapshot(), transition.expired)
        };

        let message = if expired {
            ServerMessage::Expired {
                session_id: self.session_id,
                timer: snapshot,
            }
        } else {
            ServerMessage::Updated {
                session_id: self.session_id,
                timer: snapshot,
            }
        };
        // No receivers is fine.
        let _ = self.notify.send(message);

        tracing::debug!(
            session_id = self.session_id,
            seq = snapshot.seq,
            command = command.name(),
            "Local timer write"
        );
        Ok(snapshot)
    }
}

#[async_trait]
impl TimerApi for LocalTimerApi {
    fn session_id(&self) -> DbId {
        self.session_id
    }

    async fn snapshot(&self) -> Result<TimerSnapshot, ClientError> {
        let state = self
            .state
            .lock()
            .map_err(|_| ClientError::Protocol("Local timer state is poisoned".into()))?;
        Ok(state.snapshot())
    }

    async fn set(&self, minutes: i32, seconds: i32) -> Result<TimerSnapshot, ClientError> {
        self.apply(TimerCommand::Set { minutes, seconds }, None)
    }

    async fn start(&self) -> Result<TimerSnapshot, ClientError> {
        self.apply(TimerCommand::Start, None)
    }

    async fn pause(&self) -> Result<TimerSnapshot, ClientError> {
        self.apply(TimerCommand::Pause, None)
    }

    async fn reset(&self) -> Result<TimerSnapshot, ClientError> {
        self.apply(TimerCommand::Reset, None)
    }

    async fn tick(&self, expected_seq: Option<i64>) -> Result<TimerSnapshot, ClientError> {
        self.apply(TimerCommand::Tick, expected_seq)
    }
}
