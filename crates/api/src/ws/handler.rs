use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use podium_core::error::CoreError;
use podium_core::realtime::{ClientMessage, ServerMessage, ERR_BAD_MESSAGE, ERR_SESSION_NOT_FOUND};
use podium_core::types::DbId;
use podium_db::repositories::DebateSessionRepo;
use podium_db::DbPool;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::WsAuthParams;
use crate::state::AppState;
use crate::ws::manager::{server_frame, WsManager};

/// GET /api/v1/ws?token=<access token>
///
/// Authenticates the caller, then upgrades the connection to WebSocket. An
/// invalid or missing token is rejected with 401 before the upgrade.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsAuthParams>,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let token = params.token.ok_or_else(|| {
        AppError::Core(CoreError::Unauthorized("Missing token query parameter".into()))
    })?;
    let user = AuthUser::from_token(&token, &state.config.jwt)?;

    Ok(ws.on_upgrade(move |socket| {
        handle_socket(socket, user.user_id, state.pool, state.ws_manager)
    }))
}

/// Manage a single WebSocket connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Registers the connection with `WsManager`.
///   2. Spawns a sender task that forwards messages from the manager channel.
///   3. Dispatches inbound subscribe / unsubscribe frames on the current task.
///   4. Cleans up on disconnect.
async fn handle_socket(socket: WebSocket, user_id: DbId, pool: DbPool, ws_manager: Arc<WsManager>) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, user_id, "WebSocket connected");

    let mut rx = ws_manager.add(conn_id.clone(), user_id).await;

    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(Message::Text(text)) => {
                handle_client_message(&conn_id, text.as_str(), &pool, &ws_manager).await;
            }
            Ok(_msg) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, user_id, "WebSocket disconnected");
}

/// Dispatch one inbound text frame.
async fn handle_client_message(conn_id: &str, text: &str, pool: &DbPool, ws_manager: &WsManager) {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::debug!(conn_id, error = %e, "Unparseable WebSocket frame");
            send_error(conn_id, ws_manager, ERR_BAD_MESSAGE, &e.to_string()).await;
            return;
        }
    };

    match message {
        ClientMessage::Subscribe { session_id } => {
            subscribe(conn_id, session_id, pool, ws_manager).await;
        }
        ClientMessage::Unsubscribe { session_id } => {
            ws_manager.unsubscribe(conn_id, session_id).await;
            tracing::debug!(conn_id, session_id, "Timer unsubscribed");
        }
    }
}

/// Subscribe, then send the current snapshot.
///
/// Subscribing before the read means a write that commits in between is
/// delivered as a notification; the client drops whichever copy has the
/// older `seq`.
async fn subscribe(conn_id: &str, session_id: DbId, pool: &DbPool, ws_manager: &WsManager) {
    ws_manager.subscribe(conn_id, session_id).await;

    let session = match DebateSessionRepo::find_by_id(pool, session_id).await {
        Ok(Some(session)) => session,
        Ok(None) => {
            ws_manager.unsubscribe(conn_id, session_id).await;
            let message = format!("Debate session {session_id} not found");
            send_error(conn_id, ws_manager, ERR_SESSION_NOT_FOUND, &message).await;
            return;
        }
        Err(e) => {
            tracing::error!(conn_id, session_id, error = %e, "Failed to load timer snapshot");
            return;
        }
    };

    let snapshot = ServerMessage::Snapshot {
        session_id,
        timer: session.timer_snapshot(),
    };
    match server_frame(&snapshot) {
        Ok(frame) => {
            ws_manager.send_to(conn_id, frame).await;
            tracing::debug!(conn_id, session_id, seq = session.timer_seq, "Timer subscribed");
        }
        Err(e) => tracing::error!(error = %e, "Failed to encode timer snapshot"),
    }
}

async fn send_error(conn_id: &str, ws_manager: &WsManager, code: &str, message: &str) {
    let error = ServerMessage::Error {
        code: code.to_string(),
        message: message.to_string(),
    };
    if let Ok(frame) = server_frame(&error) {
        ws_manager.send_to(conn_id, frame).await;
    }
}
