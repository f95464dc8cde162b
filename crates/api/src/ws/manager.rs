use std::collections::{HashMap, HashSet};

use axum::body::Bytes;
use axum::extract::ws::Message;
use podium_core::realtime::ServerMessage;
use podium_core::types::{DbId, Timestamp};
use tokio::sync::{mpsc, RwLock};

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// Metadata for a single WebSocket connection.
pub struct WsConnection {
    /// Authenticated user ID. The upgrade is refused without a valid token.
    pub user_id: DbId,
    /// Channel sender for outbound messages to this connection.
    pub sender: WsSender,
    /// Debate sessions whose timer notifications this connection receives.
    pub sessions: HashSet<DbId>,
    pub connected_at: Timestamp,
}

/// Encode a [`ServerMessage`] as a JSON text frame.
pub fn server_frame(message: &ServerMessage) -> Result<Message, serde_json::Error> {
    let json = serde_json::to_string(message)?;
    Ok(Message::Text(json.into()))
}

/// Result of one [`WsManager::ping_sweep`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PingSweep {
    pub pinged: usize,
    pub dropped: usize,
}

/// Manages all active WebSocket connections and their session subscriptions.
///
/// Thread-safe via interior `RwLock`; wrapped in `Arc` and shared across the
/// application.
pub struct WsManager {
    connections: RwLock<HashMap<String, WsConnection>>,
}

impl WsManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new connection with no subscriptions.
    ///
    /// Returns the receiver half of the message channel so the caller can
    /// forward messages to the WebSocket sink.
    pub async fn add(&self, conn_id: String, user_id: DbId) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = WsConnection {
            user_id,
            sender: tx,
            sessions: HashSet::new(),
            connected_at: chrono::Utc::now(),
        };
        self.connections.write().await.insert(conn_id, conn);
        rx
    }

    /// Remove a connection by its ID, dropping its subscriptions.
    pub async fn remove(&self, conn_id: &str) {
        self.connections.write().await.remove(conn_id);
    }

    /// Subscribe a connection to a session's timer notifications.
    ///
    /// Returns `false` if the connection is unknown.
    pub async fn subscribe(&self, conn_id: &str, session_id: DbId) -> bool {
        match self.connections.write().await.get_mut(conn_id) {
            Some(conn) => {
                conn.sessions.insert(session_id);
                true
            }
            None => false,
        }
    }

    /// Stop a connection's timer notifications for a session.
    ///
    /// Returns `true` if the connection was subscribed.
    pub async fn unsubscribe(&self, conn_id: &str, session_id: DbId) -> bool {
        self.connections
            .write()
            .await
            .get_mut(conn_id)
            .is_some_and(|conn| conn.sessions.remove(&session_id))
    }

    /// Send a message to a single connection.
    ///
    /// Returns `false` if the connection is unknown or its channel is closed.
    pub async fn send_to(&self, conn_id: &str, message: Message) -> bool {
        self.connections
            .read()
            .await
            .get(conn_id)
            .is_some_and(|conn| conn.sender.send(message).is_ok())
    }

    /// Send a message to every connection subscribed to `session_id`.
    ///
    /// Connections whose send channels are closed are skipped (they are
    /// cleaned up when their receive loop ends). Returns the number of
    /// connections the message was queued for.
    pub async fn send_to_session(&self, session_id: DbId, message: Message) -> usize {
        let conns = self.connections.read().await;
        let mut count = 0;
        for conn in conns.values() {
            if conn.sessions.contains(&session_id) && conn.sender.send(message.clone()).is_ok() {
                count += 1;
            }
        }
        count
    }

    /// Number of connections subscribed to `session_id`.
    pub async fn subscriber_count(&self, session_id: DbId) -> usize {
        self.connections
            .read()
            .await
            .values()
            .filter(|conn| conn.sessions.contains(&session_id))
            .count()
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send a Close frame to every connection, then clear the map.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    /// Ping every connection and forget the ones whose channel has closed.
    pub async fn ping_sweep(&self) -> PingSweep {
        let mut conns = self.connections.write().await;
        let before = conns.len();
        let now = chrono::Utc::now();

        conns.retain(|conn_id, conn| {
            let alive = conn.sender.send(Message::Ping(Bytes::new())).is_ok();
            if !alive {
                tracing::debug!(
                    conn_id = %conn_id,
                    user_id = conn.user_id,
                    subscriptions = conn.sessions.len(),
                    connected_secs = (now - conn.connected_at).num_seconds(),
                    "Forgetting closed WebSocket connection"
                );
            }
            alive
        });

        PingSweep {
            pinged: conns.len(),
            dropped: before - conns.len(),
        }
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}
