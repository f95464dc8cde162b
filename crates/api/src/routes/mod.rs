pub mod auth;
pub mod health;
pub mod sessions;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /ws?token=                                       WebSocket (timer notifications)
///
/// /auth/register                                   register (public)
/// /auth/login                                      login (public)
/// /auth/refresh                                    refresh (public)
/// /auth/logout                                     logout (requires auth)
///
/// /sessions                                        list, create
/// /sessions/{id}                                   get
/// /sessions/{id}/end                               end (host)
/// /sessions/{id}/join                              join
/// /sessions/{id}/leave                             leave
/// /sessions/{id}/participants                      list participants
/// /sessions/{id}/video-token                       video room token (participant)
///
/// /sessions/{id}/timer                             get, set (PUT, host)
/// /sessions/{id}/timer/start                       start (host)
/// /sessions/{id}/timer/pause                       pause (host)
/// /sessions/{id}/timer/reset                       reset (host)
/// /sessions/{id}/timer/tick                        tick (host)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/auth", auth::router())
        .nest("/sessions", sessions::router())
}
