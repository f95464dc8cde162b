//! Shared countdown timer of a debate session.
//!
//! [`SessionTimer`] is the authoritative countdown state. Its fields are
//! private: the only way to change a timer is [`SessionTimer::apply`], which
//! enforces the invariants in one place:
//!
//! - `0 <= remaining_seconds <= duration_seconds`
//! - `remaining_seconds` never increases while running (only `set`/`reset`
//!   raise it, and both stop the timer)
//! - a tick that reaches zero stops the timer in the same transition
//!
//! Every committed write is replicated as a [`TimerSnapshot`] carrying a
//! monotonically increasing `seq`, so subscribers can drop stale or
//! duplicated notifications instead of applying them last-write-wins.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Largest accepted minutes component of a `set` request.
pub const MAX_MINUTES: i32 = 59;

/// Largest accepted seconds component of a `set` request.
pub const MAX_SECONDS: i32 = 59;

/// Interval between countdown ticks.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Shortest accepted gap between the previous timer write and a tick.
///
/// Two host tabs that are both in sync would otherwise each land a tick
/// per second. The slack below [`TICK_INTERVAL`] absorbs request jitter.
pub const MIN_TICK_SPACING: Duration = Duration::from_millis(900);

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Rejected host operations. A rejected operation never changes state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TimerError {
    #[error(
        "Invalid timer duration {minutes}m {seconds}s: minutes and seconds must be \
         between 0 and 59 and the total must be positive"
    )]
    InvalidDuration { minutes: i32, seconds: i32 },

    #[error("Cannot start the timer: no time remaining")]
    NoTimeRemaining,
}

/// Validate a `set` request and return the total number of seconds.
pub fn validate_duration(minutes: i32, seconds: i32) -> Result<i32, TimerError> {
    let in_range = (0..=MAX_MINUTES).contains(&minutes) && (0..=MAX_SECONDS).contains(&seconds);
    let total = minutes * 60 + seconds;
    if !in_range || total <= 0 {
        return Err(TimerError::InvalidDuration { minutes, seconds });
    }
    Ok(total)
}

// ---------------------------------------------------------------------------
// Commands and phases
// ---------------------------------------------------------------------------

/// A host operation on the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum TimerCommand {
    Set { minutes: i32, seconds: i32 },
    Start,
    Pause,
    Reset,
    Tick,
}

impl TimerCommand {
    /// Short name used in logs and event payloads.
    pub fn name(&self) -> &'static str {
        match self {
            TimerCommand::Set { .. } => "set",
            TimerCommand::Start => "start",
            TimerCommand::Pause => "pause",
            TimerCommand::Reset => "reset",
            TimerCommand::Tick => "tick",
        }
    }
}

/// Observable state of a timer.
///
/// ```text
/// Idle/Set --set--> Set --start--> Running --pause--> Set
/// Running --tick (remaining > 0)--> Running
/// Running --tick (remaining = 0)--> Expired
/// Set/Expired --reset--> Set
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPhase {
    /// No duration configured yet.
    Idle,
    /// Configured and stopped with time left.
    Set,
    Running,
    /// Counted down to zero.
    Expired,
}

fn phase_of(duration_seconds: i32, remaining_seconds: i32, is_running: bool) -> TimerPhase {
    if is_running {
        TimerPhase::Running
    } else if duration_seconds == 0 {
        TimerPhase::Idle
    } else if remaining_seconds == 0 {
        TimerPhase::Expired
    } else {
        TimerPhase::Set
    }
}

// ---------------------------------------------------------------------------
// SessionTimer
// ---------------------------------------------------------------------------

/// Countdown state owned by a debate session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionTimer {
    duration_seconds: i32,
    remaining_seconds: i32,
    is_running: bool,
}

/// Result of applying a [`TimerCommand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// State after the command.
    pub timer: SessionTimer,
    /// `false` when the command was a no-op and nothing needs to be written.
    pub changed: bool,
    /// `true` only for the tick that reached zero.
    pub expired: bool,
}

impl SessionTimer {
    /// A fresh timer: no duration, not running.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a timer from stored fields, checking the invariants.
    pub fn from_parts(
        duration_seconds: i32,
        remaining_seconds: i32,
        is_running: bool,
    ) -> Result<Self, String> {
        if duration_seconds < 0 {
            return Err(format!(
                "duration_seconds must be non-negative, got {duration_seconds}"
            ));
        }
        if !(0..=duration_seconds).contains(&remaining_seconds) {
            return Err(format!(
                "remaining_seconds must be between 0 and {duration_seconds}, got {remaining_seconds}"
            ));
        }
        if is_running && remaining_seconds == 0 {
            return Err("a timer with no time remaining cannot be running".to_string());
        }
        Ok(Self {
            duration_seconds,
            remaining_seconds,
            is_running,
        })
    }

    pub fn duration_seconds(&self) -> i32 {
        self.duration_seconds
    }

    pub fn remaining_seconds(&self) -> i32 {
        self.remaining_seconds
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn phase(&self) -> TimerPhase {
        phase_of(
            self.duration_seconds,
            self.remaining_seconds,
            self.is_running,
        )
    }

    /// Apply a host command, returning the resulting transition.
    ///
    /// `pause` on a stopped timer, `start` on a running one, and `tick` on a
    /// stopped one are no-ops (`changed == false`).
    pub fn apply(&self, command: TimerCommand) -> Result<Transition, TimerError> {
        let mut next = *self;
        let mut expired = false;

        match command {
            TimerCommand::Set { minutes, seconds } => {
                let total = validate_duration(minutes, seconds)?;
                next.duration_seconds = total;
                next.remaining_seconds = total;
                next.is_running = false;
            }
            TimerCommand::Start => {
                if self.remaining_seconds <= 0 {
                    return Err(TimerError::NoTimeRemaining);
                }
                next.is_running = true;
            }
            TimerCommand::Pause => {
                next.is_running = false;
            }
            TimerCommand::Reset => {
                next.remaining_seconds = self.duration_seconds;
                next.is_running = false;
            }
            TimerCommand::Tick => {
                if self.is_running {
                    next.remaining_seconds = (self.remaining_seconds - 1).max(0);
                    if next.remaining_seconds == 0 {
                        next.is_running = false;
                        expired = true;
                    }
                }
            }
        }

        Ok(Transition {
            timer: next,
            changed: next != *self,
            expired,
        })
    }
}

/// Predict the remaining seconds `elapsed` after a confirmed state.
///
/// A stopped timer does not move; a running one loses one second per whole
/// elapsed second, floored at zero.
pub fn predict_remaining(remaining_seconds: i32, is_running: bool, elapsed: Duration) -> i32 {
    if !is_running {
        return remaining_seconds;
    }
    let elapsed_secs = i32::try_from(elapsed.as_secs()).unwrap_or(i32::MAX);
    remaining_seconds.saturating_sub(elapsed_secs).max(0)
}

// ---------------------------------------------------------------------------
// TimerSnapshot
// ---------------------------------------------------------------------------

/// A committed timer state as replicated to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub duration_seconds: i32,
    pub remaining_seconds: i32,
    pub is_running: bool,
    /// Bumped by one on every committed write.
    pub seq: i64,
    /// Time of the last write. Informational only; ordering uses `seq`.
    pub updated_at: Timestamp,
}

impl TimerSnapshot {
    pub fn new(timer: SessionTimer, seq: i64, updated_at: Timestamp) -> Self {
        Self {
            duration_seconds: timer.duration_seconds,
            remaining_seconds: timer.remaining_seconds,
            is_running: timer.is_running,
            seq,
            updated_at,
        }
    }

    /// Rebuild the validated timer state carried by this snapshot.
    pub fn timer(&self) -> Result<SessionTimer, String> {
        SessionTimer::from_parts(
            self.duration_seconds,
            self.remaining_seconds,
            self.is_running,
        )
    }

    pub fn phase(&self) -> TimerPhase {
        phase_of(
            self.duration_seconds,
            self.remaining_seconds,
            self.is_running,
        )
    }

    /// Returns `true` if this snapshot supersedes one with `seq`.
    pub fn is_newer_than(&self, seq: i64) -> bool {
        self.seq > seq
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
