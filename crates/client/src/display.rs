//! Client-side view of a session timer.
//!
//! A [`TimerDisplay`] keeps the last authoritative snapshot (`confirmed`)
//! next to a local prediction that the countdown ticker advances once per
//! second. Authoritative snapshots are applied only when their `seq` is
//! newer than the confirmed one, and replace the prediction entirely.
//!
//! The time's-up cue is keyed to authoritative data: [`ApplyOutcome::Expired`]
//! is returned for the snapshot that carries the transition to zero, at
//! most once per expiring `seq`. A local prediction reaching zero never
//! reports an expiry.

use std::sync::Arc;

use podium_core::timer::{predict_remaining, TimerPhase, TimerSnapshot};
use podium_core::types::DbId;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::alert::Alert;

/// Display shared by the ticker, the subscriber, and the host controller.
pub type SharedDisplay = Arc<Mutex<TimerDisplay>>;

/// What happened when a snapshot was offered to the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Not newer than the confirmed state; ignored.
    Stale,
    Applied,
    /// Applied, and this snapshot is the expiry of the countdown.
    Expired,
}

#[derive(Debug)]
pub struct TimerDisplay {
    session_id: DbId,
    confirmed: Option<TimerSnapshot>,
    predicted_remaining: i32,
    is_running: bool,
    /// Remaining seconds and instant the clock-based prediction counts from.
    anchor: (i32, Instant),
    last_expired_seq: Option<i64>,
}

impl TimerDisplay {
    pub fn new(session_id: DbId) -> Self {
        Self {
            session_id,
            confirmed: None,
            predicted_remaining: 0,
            is_running: false,
            anchor: (0, Instant::now()),
            last_expired_seq: None,
        }
    }

    pub fn session_id(&self) -> DbId {
        self.session_id
    }

    /// Seq of the confirmed snapshot, if one has been applied.
    pub fn seq(&self) -> Option<i64> {
        self.confirmed.map(|c| c.seq)
    }

    pub fn confirmed(&self) -> Option<&TimerSnapshot> {
        self.confirmed.as_ref()
    }

    pub fn duration_seconds(&self) -> i32 {
        self.confirmed.map_or(0, |c| c.duration_seconds)
    }

    /// Remaining seconds as advanced by local ticks.
    pub fn remaining(&self) -> i32 {
        self.predicted_remaining
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn phase(&self) -> TimerPhase {
        if self.is_running {
            TimerPhase::Running
        } else if self.duration_seconds() == 0 {
            TimerPhase::Idle
        } else if self.predicted_remaining == 0 {
            TimerPhase::Expired
        } else {
            TimerPhase::Set
        }
    }

    /// Offer an authoritative snapshot.
    ///
    /// `announced_expiry` is set when the snapshot arrived as a
    /// `timer.expired` notification.
    pub fn apply(
        &mut self,
        snapshot: TimerSnapshot,
        announced_expiry: bool,
        now: Instant,
    ) -> ApplyOutcome {
        let previous = self.confirmed;
        if let Some(prev) = previous {
            if !snapshot.is_newer_than(prev.seq) {
                return ApplyOutcome::Stale;
            }
        }

        let reached_zero = snapshot.remaining_seconds == 0
            && !snapshot.is_running
            && snapshot.duration_seconds > 0;
        let crossed_zero = reached_zero
            && previous.is_some_and(|prev| prev.is_running && prev.remaining_seconds > 0);
        let expired = ((announced_expiry && reached_zero) || crossed_zero)
            && self.last_expired_seq != Some(snapshot.seq);

        self.confirmed = Some(snapshot);
        self.predicted_remaining = snapshot.remaining_seconds;
        self.is_running = snapshot.is_running;
        self.anchor = (snapshot.remaining_seconds, now);

        if expired {
            self.last_expired_seq = Some(snapshot.seq);
            ApplyOutcome::Expired
        } else {
            ApplyOutcome::Applied
        }
    }

    /// `true` while the local countdown should keep ticking.
    pub fn should_tick(&self) -> bool {
        self.is_running && self.predicted_remaining > 0
    }

    /// Advance the prediction by one second. Returns `false` when the
    /// countdown is stopped or already at zero.
    pub fn local_tick(&mut self) -> bool {
        if !self.should_tick() {
            return false;
        }
        self.predicted_remaining -= 1;
        true
    }

    /// Flip the local running flag ahead of a host write. Returns the
    /// previous value so the caller can roll back on failure.
    pub fn set_optimistic_running(&mut self, running: bool, now: Instant) -> bool {
        let previous = self.is_running;
        self.is_running = running;
        self.anchor = (self.predicted_remaining, now);
        previous
    }

    /// Remaining seconds at `now`, counting whole seconds since the last
    /// confirmation or running-flag change.
    pub fn remaining_at(&self, now: Instant) -> i32 {
        let (remaining, since) = self.anchor;
        predict_remaining(
            remaining,
            self.is_running,
            now.saturating_duration_since(since),
        )
    }
}

/// Apply an authoritative snapshot to a shared display and sound the
/// alert if it reports the expiry.
pub async fn confirm(
    display: &Mutex<TimerDisplay>,
    alert: &dyn Alert,
    snapshot: TimerSnapshot,
    announced_expiry: bool,
) -> ApplyOutcome {
    let (outcome, session_id) = {
        let mut display = display.lock().await;
        let outcome = display.apply(snapshot, announced_expiry, Instant::now());
        (outcome, display.session_id())
    };

    match outcome {
        ApplyOutcome::Expired => alert.time_up(session_id, snapshot.seq),
        ApplyOutcome::Applied => tracing::debug!(
            session_id,
            seq = snapshot.seq,
            remaining_seconds = snapshot.remaining_seconds,
            is_running = snapshot.is_running,
            "Applied timer snapshot"
        ),
        ApplyOutcome::Stale => tracing::trace!(
            session_id,
            seq = snapshot.seq,
            "Ignored stale timer snapshot"
        ),
    }
    outcome
}

/// Render seconds as `mm:ss`.
pub fn format_clock(seconds: i32) -> String {
    let seconds = seconds.max(0);
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
