//! Timer API seam used by the host controller and the ticker.
//!
//! [`TimerApi`] is implemented over HTTP by [`HttpTimerApi`] and in memory
//! by [`crate::local::LocalTimerApi`] for solo practice and tests. Every
//! method returns the authoritative snapshot after the command.

use std::sync::Arc;

use async_trait::async_trait;
use podium_core::timer::TimerSnapshot;
use podium_core::types::DbId;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::auth::TokenSource;
use crate::error::ClientError;

#[async_trait]
pub trait TimerApi: Send + Sync {
    /// Session this API is bound to.
    fn session_id(&self) -> DbId;

    async fn snapshot(&self) -> Result<TimerSnapshot, ClientError>;

    async fn set(&self, minutes: i32, seconds: i32) -> Result<TimerSnapshot, ClientError>;

    async fn start(&self) -> Result<TimerSnapshot, ClientError>;

    async fn pause(&self) -> Result<TimerSnapshot, ClientError>;

    async fn reset(&self) -> Result<TimerSnapshot, ClientError>;

    /// Count down one second. With `expected_seq`, the write is rejected
    /// when another write has landed since that seq.
    async fn tick(&self, expected_seq: Option<i64>) -> Result<TimerSnapshot, ClientError>;
}

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
    code: Option<String>,
}

/// [`TimerApi`] over the REST endpoints under `/api/v1/sessions/{id}/timer`.
pub struct HttpTimerApi {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<TokenSource>,
    session_id: DbId,
}

impl HttpTimerApi {
    /// * `base_url` - API root, e.g. `http://localhost:3000/api/v1`.
    /// * `tokens`   - supplies the bearer credential for each request.
    pub fn new(base_url: impl Into<String>, tokens: Arc<TokenSource>, session_id: DbId) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
            session_id,
        }
    }

    fn timer_url(&self, action: Option<&str>) -> String {
        match action {
            Some(action) => format!(
                "{}/sessions/{}/timer/{action}",
                self.base_url, self.session_id
            ),
            None => format!("{}/sessions/{}/timer", self.base_url, self.session_id),
        }
    }

    async fn post(
        &self,
        action: &str,
        body: serde_json::Value,
    ) -> Result<TimerSnapshot, ClientError> {
        let response = self
            .http
            .post(self.timer_url(Some(action)))
            .bearer_auth(self.tokens.access_token().await?)
            .json(&body)
            .send()
            .await?;
        read_data(response).await
    }
}

/// Pass a success response through, or turn an error body into
/// [`ClientError::Status`].
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let (message, code) = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => (body.error, body.code),
        Err(_) => (text, None),
    };
    Err(ClientError::Status {
        status: status.as_u16(),
        code,
        message,
    })
}

/// Unwrap a `{ "data": ... }` body.
async fn read_data<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let envelope: DataEnvelope<T> = check_status(response)
        .await?
        .json()
        .await
        .map_err(|e| ClientError::Protocol(format!("Unexpected response body: {e}")))?;
    Ok(envelope.data)
}

#[async_trait]
impl TimerApi for HttpTimerApi {
    fn session_id(&self) -> DbId {
        self.session_id
    }

    async fn snapshot(&self) -> Result<TimerSnapshot, ClientError> {
        let response = self
            .http
            .get(self.timer_url(None))
            .bearer_auth(self.tokens.access_token().await?)
            .send()
            .await?;
        read_data(response).await
    }

    async fn set(&self, minutes: i32, seconds: i32) -> Result<TimerSnapshot, ClientError> {
        let response = self
            .http
            .put(self.timer_url(None))
            .bearer_auth(self.tokens.access_token().await?)
            .json(&json!({ "minutes": minutes, "seconds": seconds }))
            .send()
            .await?;
        read_data(response).await
    }

    async fn start(&self) -> Result<TimerSnapshot, ClientError> {
        self.post("start", json!({})).await
    }

    async fn pause(&self) -> Result<TimerSnapshot, ClientError> {
        self.post("pause", json!({})).await
    }

    async fn reset(&self) -> Result<TimerSnapshot, ClientError> {
        self.post("reset", json!({})).await
    }

    async fn tick(&self, expected_seq: Option<i64>) -> Result<TimerSnapshot, ClientError> {
        let body = match expected_seq {
            Some(seq) => json!({ "expected_seq": seq }),
            None => json!({}),
        };
        self.post("tick", body).await
    }
}
