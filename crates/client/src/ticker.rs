//! Per-second countdown driver.
//!
//! Every client runs a ticker that advances its local prediction once per
//! second while the display is running with time left. On the host the
//! ticker also writes a `tick` carrying the displayed `seq`, so a second
//! host tab ticking from stale state is rejected instead of counting the
//! same second twice.

use std::sync::Arc;

use podium_core::timer::TICK_INTERVAL;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::alert::Alert;
use crate::api::TimerApi;
use crate::display::{confirm, ApplyOutcome, SharedDisplay};

/// Result of one ticker step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStep {
    /// Stopped or at zero; nothing happened.
    Idle,
    /// Local prediction advanced (observer).
    Local,
    /// Host tick written; the response was offered to the display.
    Confirmed(ApplyOutcome),
    /// Host tick write failed. The local countdown keeps going and the next
    /// authoritative update corrects it.
    Failed,
}

pub struct CountdownTicker {
    display: SharedDisplay,
    alert: Arc<dyn Alert>,
    host_api: Option<Arc<dyn TimerApi>>,
}

impl CountdownTicker {
    /// Ticker that only advances the local display.
    pub fn observer(display: SharedDisplay, alert: Arc<dyn Alert>) -> Self {
        Self {
            display,
            alert,
            host_api: None,
        }
    }

    /// Ticker that also drives the authoritative countdown through `api`.
    pub fn host(display: SharedDisplay, alert: Arc<dyn Alert>, api: Arc<dyn TimerApi>) -> Self {
        Self {
            display,
            alert,
            host_api: Some(api),
        }
    }

    pub async fn step(&self) -> TickStep {
        let (seq, session_id) = {
            let mut display = self.display.lock().await;
            if !display.local_tick() {
                return TickStep::Idle;
            }
            (display.seq(), display.session_id())
        };

        let Some(api) = &self.host_api else {
            return TickStep::Local;
        };

        match api.tick(seq).await {
            Ok(snapshot) => {
                TickStep::Confirmed(confirm(&self.display, self.alert.as_ref(), snapshot, false).await)
            }
            Err(e) => {
                tracing::warn!(
                    session_id,
                    expected_seq = ?seq,
                    error = %e,
                    "Timer tick write failed"
                );
                TickStep::Failed
            }
        }
    }

    /// Step once per [`TICK_INTERVAL`] until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("Countdown ticker stopped");
                    break;
                }
                _ = interval.tick() => {
                    self.step().await;
                }
            }
        }
    }
}
