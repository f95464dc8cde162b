//! WebSocket infrastructure for timer change notifications.
//!
//! Provides connection management with per-session subscriptions, a
//! heartbeat that pings subscribers and forgets closed connections, and the
//! HTTP upgrade handler used by Axum routes.

mod handler;
mod heartbeat;
pub mod manager;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::{server_frame, PingSweep, WsManager};
