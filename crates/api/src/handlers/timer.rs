//! Handlers for the shared countdown timer of a debate session.
//!
//! Every mutation follows the same path: load the session, check that the
//! caller is the host and the session is open, run the command through
//! [`SessionTimer::apply`], and persist the result with a conditional write
//! keyed on the current `timer_seq`. Commands that change nothing are not
//! written and return the current snapshot. Each committed write is
//! published on the event bus and fanned out to WebSocket subscribers.

use axum::extract::{Path, State};
use axum::Json;
use podium_core::error::CoreError;
use podium_core::event_types;
use podium_core::timer::{TimerCommand, TimerSnapshot};
use podium_core::types::DbId;
use podium_db::repositories::DebateSessionRepo;
use podium_events::DomainEvent;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::host::{ensure_host, ensure_open, load_session};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `PUT /sessions/{id}/timer`.
#[derive(Debug, Deserialize)]
pub struct SetTimerRequest {
    pub minutes: i32,
    pub seconds: i32,
}

/// Request body for `POST /sessions/{id}/timer/tick`.
#[derive(Debug, Default, Deserialize)]
pub struct TickRequest {
    /// The `seq` the host last displayed. A mismatch means another write
    /// landed first and the tick is rejected with 409.
    #[serde(default)]
    pub expected_seq: Option<i64>,
}

type TimerResponse = AppResult<Json<DataResponse<TimerSnapshot>>>;

/// GET /api/v1/sessions/{id}/timer
///
/// Any authenticated user may read the timer.
pub async fn get_timer(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(session_id): Path<DbId>,
) -> TimerResponse {
    let session = load_session(&state.pool, session_id).await?;
    Ok(Json(DataResponse {
        data: session.timer_snapshot(),
    }))
}

/// PUT /api/v1/sessions/{id}/timer
pub async fn set_timer(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(session_id): Path<DbId>,
    Json(input): Json<SetTimerRequest>,
) -> TimerResponse {
    let command = TimerCommand::Set {
        minutes: input.minutes,
        seconds: input.seconds,
    };
    respond(apply_command(&state, &auth, session_id, command, None).await)
}

/// POST /api/v1/sessions/{id}/timer/start
pub async fn start_timer(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(session_id): Path<DbId>,
) -> TimerResponse {
    respond(apply_command(&state, &auth, session_id, TimerCommand::Start, None).await)
}

/// POST /api/v1/sessions/{id}/timer/pause
pub async fn pause_timer(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(session_id): Path<DbId>,
) -> TimerResponse {
    respond(apply_command(&state, &auth, session_id, TimerCommand::Pause, None).await)
}

/// POST /api/v1/sessions/{id}/timer/reset
pub async fn reset_timer(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(session_id): Path<DbId>,
) -> TimerResponse {
    respond(apply_command(&state, &auth, session_id, TimerCommand::Reset, None).await)
}

/// POST /api/v1/sessions/{id}/timer/tick
///
/// Body: `{"expected_seq": N}` or `{}`.
pub async fn tick_timer(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(session_id): Path<DbId>,
    Json(input): Json<TickRequest>,
) -> TimerResponse {
    respond(
        apply_command(
            &state,
            &auth,
            session_id,
            TimerCommand::Tick,
            input.expected_seq,
        )
        .await,
    )
}

fn respond(result: AppResult<TimerSnapshot>) -> TimerResponse {
    result.map(|data| Json(DataResponse { data }))
}

/// Apply one host command and persist it.
///
/// Errors: 404 unknown session, 403 caller is not the host, 409 session
/// ended, stale `expected_seq`, a concurrent write won the race, or a tick
/// arrived within the configured tick spacing of the previous write, plus the
/// command's own validation errors.
pub async fn apply_command(
    state: &AppState,
    auth: &AuthUser,
    session_id: DbId,
    command: TimerCommand,
    expected_seq: Option<i64>,
) -> AppResult<TimerSnapshot> {
    let session = load_session(&state.pool, session_id).await?;
    ensure_host(&session, auth)?;
    ensure_open(&session)?;

    if let Some(expected) = expected_seq {
        if expected != session.timer_seq {
            tracing::debug!(
                session_id,
                expected,
                current = session.timer_seq,
                command = command.name(),
                "Rejected timer command with stale seq"
            );
            return Err(stale_seq(session.timer_seq, expected));
        }
    }

    let timer = session.timer().map_err(AppError::InternalError)?;
    let transition = timer.apply(command)?;

    if !transition.changed {
        tracing::debug!(
            session_id,
            seq = session.timer_seq,
            command = command.name(),
            "Timer command was a no-op"
        );
        return Ok(session.timer_snapshot());
    }

    // Ticks must trail the previous write, so two in-sync host tabs cannot
    // both count the same second.
    let min_spacing_ms =
        (command == TimerCommand::Tick).then(|| state.config.timer.min_tick_spacing_ms());

    let updated = DebateSessionRepo::write_timer(
        &state.pool,
        session_id,
        auth.user_id,
        session.timer_seq,
        &transition.timer,
        min_spacing_ms,
    )
    .await?
    .ok_or_else(|| {
        let message = if command == TimerCommand::Tick {
            "Tick arrived too soon or the timer was changed by another request"
        } else {
            "Timer was changed by another request; reload and retry"
        };
        tracing::debug!(session_id, command = command.name(), "Conditional timer write lost");
        AppError::Core(CoreError::Conflict(message.into()))
    })?;

    let snapshot = updated.timer_snapshot();

    let event_type = if transition.expired {
        event_types::TIMER_EXPIRED
    } else {
        event_types::TIMER_UPDATED
    };

    if transition.expired {
        tracing::info!(session_id, seq = snapshot.seq, "Timer expired");
    } else if command != TimerCommand::Tick {
        tracing::info!(
            session_id,
            user_id = auth.user_id,
            host = %auth.username,
            command = command.name(),
            seq = snapshot.seq,
            remaining_seconds = snapshot.remaining_seconds,
            "Timer updated"
        );
    }

    state.event_bus.publish(
        DomainEvent::timer(event_type, session_id, &snapshot).with_actor(auth.user_id),
    );

    Ok(snapshot)
}

fn stale_seq(current: i64, expected: i64) -> AppError {
    AppError::Core(CoreError::Conflict(format!(
        "Timer is at seq {current}, request expected {expected}"
    )))
}
