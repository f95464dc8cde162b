//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// Generic pagination parameters (`?limit=&offset=`).
///
/// Values are clamped by the handler via `clamp_limit` / `clamp_offset`.
#[derive(Debug, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Query parameters for the WebSocket upgrade (`?token=`).
///
/// Browsers cannot set an `Authorization` header on a WebSocket handshake,
/// so the access token travels in the query string.
#[derive(Debug, Deserialize)]
pub struct WsAuthParams {
    pub token: Option<String>,
}
