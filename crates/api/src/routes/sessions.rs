//! Route definitions for debate sessions and their timer.
//!
//! All endpoints require authentication via the `AuthUser` extractor.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{debate_session, timer};
use crate::state::AppState;

/// Routes mounted at `/sessions`.
///
/// ```text
/// GET  /                         -> list_sessions
/// POST /                         -> create_session
/// GET  /{id}                     -> get_session
/// POST /{id}/end                 -> end_session
/// POST /{id}/join                -> join_session
/// POST /{id}/leave               -> leave_session
/// GET  /{id}/participants        -> list_participants
/// POST /{id}/video-token         -> video_token
/// GET  /{id}/timer               -> get_timer
/// PUT  /{id}/timer               -> set_timer
/// POST /{id}/timer/start         -> start_timer
/// POST /{id}/timer/pause         -> pause_timer
/// POST /{id}/timer/reset         -> reset_timer
/// POST /{id}/timer/tick          -> tick_timer
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(debate_session::list_sessions).post(debate_session::create_session),
        )
        .route("/{id}", get(debate_session::get_session))
        .route("/{id}/end", post(debate_session::end_session))
        .route("/{id}/join", post(debate_session::join_session))
        .route("/{id}/leave", post(debate_session::leave_session))
        .route(
            "/{id}/participants",
            get(debate_session::list_participants),
        )
        .route("/{id}/video-token", post(debate_session::video_token))
        .route("/{id}/timer", get(timer::get_timer).put(timer::set_timer))
        .route("/{id}/timer/start", post(timer::start_timer))
        .route("/{id}/timer/pause", post(timer::pause_timer))
        .route("/{id}/timer/reset", post(timer::reset_timer))
        .route("/{id}/timer/tick", post(timer::tick_timer))
}
