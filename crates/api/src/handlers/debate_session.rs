//! Handlers for debate sessions, their participants, and video room tokens.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use podium_core::debate::{
    clamp_limit, clamp_offset, participant_roles, validate_format, validate_join_role,
    validate_motion, validate_title, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT, ROOM_NAME_PREFIX,
};
use podium_core::error::CoreError;
use podium_core::event_types;
use podium_core::types::DbId;
use podium_db::models::debate_session::{CreateDebateSession, CreateDebateSessionRequest};
use podium_db::models::participant::JoinSessionRequest;
use podium_db::repositories::{DebateSessionRepo, ParticipantRepo};
use podium_events::DomainEvent;

use crate::auth::video::generate_room_token;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::host::{
    ensure_open, load_session, require_host, require_participant,
};
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// POST /api/v1/sessions
///
/// Create a debate session. The caller becomes its host and first
/// participant. The timer starts idle.
pub async fn create_session(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateDebateSessionRequest>,
) -> AppResult<impl IntoResponse> {
    validate_title(&input.title).map_err(|m| AppError::Core(CoreError::Validation(m)))?;
    validate_motion(input.motion.as_deref())
        .map_err(|m| AppError::Core(CoreError::Validation(m)))?;
    validate_format(&input.format).map_err(|m| AppError::Core(CoreError::Validation(m)))?;

    let motion = input
        .motion
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty());

    let session = DebateSessionRepo::create(
        &state.pool,
        &CreateDebateSession {
            title: input.title.trim().to_string(),
            motion,
            format: input.format,
            host_user_id: auth.user_id,
            room_name: format!("{ROOM_NAME_PREFIX}{}", uuid::Uuid::new_v4()),
        },
    )
    .await?;

    ParticipantRepo::join(
        &state.pool,
        session.id,
        auth.user_id,
        participant_roles::HOST,
    )
    .await?;

    tracing::info!(
        session_id = session.id,
        user_id = auth.user_id,
        format = %session.format,
        "Debate session created"
    );

    state.event_bus.publish(
        DomainEvent::new(event_types::SESSION_CREATED)
            .for_session(session.id)
            .with_actor(auth.user_id)
            .with_payload(serde_json::json!({
                "title": session.title,
                "format": session.format,
            })),
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: session })))
}

/// GET /api/v1/sessions
///
/// List sessions that have not ended, newest first.
pub async fn list_sessions(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let limit = clamp_limit(params.limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT);
    let offset = clamp_offset(params.offset);
    let sessions = DebateSessionRepo::list_active(&state.pool, limit, offset).await?;
    Ok(Json(DataResponse { data: sessions }))
}

/// GET /api/v1/sessions/{id}
pub async fn get_session(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(session_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let session = load_session(&state.pool, session_id).await?;
    Ok(Json(DataResponse { data: session }))
}

/// POST /api/v1/sessions/{id}/end
///
/// End a session. Host only. A running timer is stopped in the same write
/// and subscribers are notified.
pub async fn end_session(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(session_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let before = require_host(&state.pool, session_id, &auth).await?;
    ensure_open(&before)?;

    let session = DebateSessionRepo::end(&state.pool, session_id, auth.user_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(format!(
                "Session {session_id} has already ended"
            )))
        })?;

    tracing::info!(session_id, user_id = auth.user_id, "Debate session ended");

    if session.timer_seq != before.timer_seq {
        state.event_bus.publish(
            DomainEvent::timer(
                event_types::TIMER_UPDATED,
                session_id,
                &session.timer_snapshot(),
            )
            .with_actor(auth.user_id),
        );
    }
    state.event_bus.publish(
        DomainEvent::new(event_types::SESSION_ENDED)
            .for_session(session_id)
            .with_actor(auth.user_id),
    );

    Ok(Json(DataResponse { data: session }))
}

// ---------------------------------------------------------------------------
// Participants
// ---------------------------------------------------------------------------

/// POST /api/v1/sessions/{id}/join
///
/// Join (or re-join) a session as debater, judge, or observer.
pub async fn join_session(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(session_id): Path<DbId>,
    Json(input): Json<JoinSessionRequest>,
) -> AppResult<impl IntoResponse> {
    validate_join_role(&input.role).map_err(|m| AppError::Core(CoreError::Validation(m)))?;

    let session = load_session(&state.pool, session_id).await?;
    ensure_open(&session)?;
    if session.is_host(auth.user_id) {
        return Err(AppError::Core(CoreError::Conflict(
            "The host is already a participant".into(),
        )));
    }

    let participant =
        ParticipantRepo::join(&state.pool, session_id, auth.user_id, &input.role).await?;

    tracing::info!(session_id, user_id = auth.user_id, role = %input.role, "Participant joined");

    state.event_bus.publish(
        DomainEvent::new(event_types::PARTICIPANT_JOINED)
            .for_session(session_id)
            .with_actor(auth.user_id)
            .with_payload(serde_json::json!({ "role": input.role })),
    );

    Ok(Json(DataResponse { data: participant }))
}

/// POST /api/v1/sessions/{id}/leave
///
/// Leave a session. The host ends the session instead.
pub async fn leave_session(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(session_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let session = load_session(&state.pool, session_id).await?;
    if session.is_host(auth.user_id) {
        return Err(AppError::Core(CoreError::Conflict(
            "The host cannot leave; end the session instead".into(),
        )));
    }

    let left = ParticipantRepo::leave(&state.pool, session_id, auth.user_id).await?;
    if !left {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Participant",
            id: auth.user_id,
        }));
    }

    tracing::info!(session_id, user_id = auth.user_id, "Participant left");

    state.event_bus.publish(
        DomainEvent::new(event_types::PARTICIPANT_LEFT)
            .for_session(session_id)
            .with_actor(auth.user_id),
    );

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/sessions/{id}/participants
pub async fn list_participants(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(session_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    load_session(&state.pool, session_id).await?;
    let participants = ParticipantRepo::list_for_session(&state.pool, session_id).await?;
    Ok(Json(DataResponse { data: participants }))
}

// ---------------------------------------------------------------------------
// Video
// ---------------------------------------------------------------------------

/// POST /api/v1/sessions/{id}/video-token
///
/// Issue a token for the session's video room. The host joins as moderator.
pub async fn video_token(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(session_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let video = state
        .config
        .video
        .as_ref()
        .ok_or_else(|| AppError::BadRequest("Video conferencing is not configured".into()))?;

    let session = load_session(&state.pool, session_id).await?;
    ensure_open(&session)?;
    require_participant(&state.pool, session_id, &auth).await?;

    let token = generate_room_token(
        auth.user_id,
        &session.room_name,
        session.is_host(auth.user_id),
        video,
    )
    .map_err(|e| AppError::InternalError(format!("Room token generation error: {e}")))?;

    tracing::debug!(session_id, user_id = auth.user_id, "Video room token issued");

    Ok(Json(DataResponse { data: token }))
}
