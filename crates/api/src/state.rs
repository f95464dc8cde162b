use std::sync::Arc;

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: podium_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// WebSocket connection manager (timer clients).
    pub ws_manager: Arc<WsManager>,
    /// Event bus every committed change is published on.
    pub event_bus: Arc<podium_events::EventBus>,
}
