//! Error type shared by the timer client components.

use podium_core::timer::TimerError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure talking to the API.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API returned {status}: {message}")]
    Status {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// A frame or response body did not match the expected shape.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The command was rejected before anything was sent or written.
    #[error(transparent)]
    Timer(#[from] TimerError),
}

impl ClientError {
    /// `true` for 409 responses: the write lost a race or the seq was stale.
    pub fn is_conflict(&self) -> bool {
        matches!(self, ClientError::Status { status: 409, .. })
    }
}
