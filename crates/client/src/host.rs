//! Host-side timer controls.
//!
//! `start` and `pause` flip the local running flag before the write so the
//! display reacts immediately, and roll it back if the write fails. `set`
//! and `reset` wait for the authoritative response. Every successful
//! response goes through [`confirm`], so a response that lost the race to
//! a newer notification is dropped by its `seq`.

use std::sync::Arc;

use podium_core::timer::{validate_duration, TimerError, TimerSnapshot};
use tokio::time::Instant;

use crate::alert::Alert;
use crate::api::TimerApi;
use crate::display::{confirm, SharedDisplay};
use crate::error::ClientError;

pub struct HostController {
    api: Arc<dyn TimerApi>,
    display: SharedDisplay,
    alert: Arc<dyn Alert>,
}

impl HostController {
    pub fn new(api: Arc<dyn TimerApi>, display: SharedDisplay, alert: Arc<dyn Alert>) -> Self {
        Self {
            api,
            display,
            alert,
        }
    }

    /// Load the current timer into the display.
    pub async fn refresh(&self) -> Result<TimerSnapshot, ClientError> {
        let snapshot = self.api.snapshot().await?;
        confirm(&self.display, self.alert.as_ref(), snapshot, false).await;
        Ok(snapshot)
    }

    pub async fn set(&self, minutes: i32, seconds: i32) -> Result<TimerSnapshot, ClientError> {
        validate_duration(minutes, seconds)?;
        let snapshot = self.api.set(minutes, seconds).await.inspect_err(|e| {
            tracing::warn!(
                session_id = self.api.session_id(),
                minutes,
                seconds,
                error = %e,
                "Timer set failed"
            );
        })?;
        confirm(&self.display, self.alert.as_ref(), snapshot, false).await;
        Ok(snapshot)
    }

    pub async fn start(&self) -> Result<TimerSnapshot, ClientError> {
        let previous = {
            let mut display = self.display.lock().await;
            if display.remaining() <= 0 {
                return Err(TimerError::NoTimeRemaining.into());
            }
            display.set_optimistic_running(true, Instant::now())
        };
        self.write_running(true, previous).await
    }

    pub async fn pause(&self) -> Result<TimerSnapshot, ClientError> {
        let previous = self
            .display
            .lock()
            .await
            .set_optimistic_running(false, Instant::now());
        self.write_running(false, previous).await
    }

    pub async fn reset(&self) -> Result<TimerSnapshot, ClientError> {
        let snapshot = self.api.reset().await.inspect_err(|e| {
            tracing::warn!(
                session_id = self.api.session_id(),
                error = %e,
                "Timer reset failed"
            );
        })?;
        confirm(&self.display, self.alert.as_ref(), snapshot, false).await;
        Ok(snapshot)
    }

    async fn write_running(
        &self,
        running: bool,
        previous: bool,
    ) -> Result<TimerSnapshot, ClientError> {
        let result = if running {
            self.api.start().await
        } else {
            self.api.pause().await
        };

        match result {
            Ok(snapshot) => {
                confirm(&self.display, self.alert.as_ref(), snapshot, false).await;
                Ok(snapshot)
            }
            Err(e) => {
                tracing::warn!(
                    session_id = self.api.session_id(),
                    command = if running { "start" } else { "pause" },
                    error = %e,
                    "Timer write failed, rolling back"
                );
                self.display
                    .lock()
                    .await
                    .set_optimistic_running(previous, Instant::now());
                Err(e)
            }
        }
    }
}
