//! Access tokens for the timer client.
//!
//! A host keeps the timer open for a whole round, longer than one access
//! token lives. [`TokenSource::sign_in`] logs in under a client label and
//! renews the access token with its refresh token shortly before it
//! expires. [`TokenSource::fixed`] wraps a token handed in from outside and
//! never renews it.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::api::check_status;
use crate::error::ClientError;

/// Renew this long before the access token expires.
const RENEW_MARGIN: Duration = Duration::from_secs(60);

#[derive(Deserialize)]
struct TokenPair {
    access_token: String,
    refresh_token: String,
    /// Access token lifetime in seconds.
    expires_in: i64,
}

struct Renewal {
    refresh_token: String,
    at: Instant,
}

struct TokenState {
    access_token: String,
    renewal: Option<Renewal>,
}

impl TokenState {
    fn from_pair(pair: TokenPair) -> Self {
        Self {
            renewal: Some(Renewal {
                refresh_token: pair.refresh_token,
                at: Instant::now() + renew_after(pair.expires_in),
            }),
            access_token: pair.access_token,
        }
    }
}

pub struct TokenSource {
    http: reqwest::Client,
    /// API root, e.g. `http://localhost:3000/api/v1`. Empty for fixed tokens.
    base_url: String,
    state: Mutex<TokenState>,
}

impl TokenSource {
    pub fn fixed(access_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: String::new(),
            state: Mutex::new(TokenState {
                access_token: access_token.into(),
                renewal: None,
            }),
        }
    }

    /// Log in and keep the login's tokens fresh from then on.
    ///
    /// `client_label` is stored with the login, e.g. `podium-timer (host)`.
    pub async fn sign_in(
        base_url: impl Into<String>,
        username: &str,
        password: &str,
        client_label: &str,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::new();
        let base_url = base_url.into().trim_end_matches('/').to_string();

        let response = http
            .post(format!("{base_url}/auth/login"))
            .json(&json!({
                "username": username,
                "password": password,
                "client_label": client_label,
            }))
            .send()
            .await?;
        let pair = read_pair(response).await?;
        tracing::info!(username, client_label, "Signed in");

        Ok(Self {
            http,
            base_url,
            state: Mutex::new(TokenState::from_pair(pair)),
        })
    }

    /// Current access token, renewed first if it is close to expiry.
    pub async fn access_token(&self) -> Result<String, ClientError> {
        let mut state = self.state.lock().await;

        let due = state
            .renewal
            .as_ref()
            .filter(|renewal| Instant::now() >= renewal.at)
            .map(|renewal| renewal.refresh_token.clone());

        if let Some(refresh_token) = due {
            let response = self
                .http
                .post(format!("{}/auth/refresh", self.base_url))
                .json(&json!({ "refresh_token": refresh_token }))
                .send()
                .await?;
            *state = TokenState::from_pair(read_pair(response).await?);
            tracing::debug!("Access token renewed");
        }

        Ok(state.access_token.clone())
    }

    /// Sign this login out on the server. Fixed tokens are left alone, since
    /// whoever issued them owns that login.
    pub async fn sign_out(&self) -> Result<(), ClientError> {
        if self.state.lock().await.renewal.is_none() {
            return Ok(());
        }

        let access_token = self.access_token().await?;
        let response = self
            .http
            .post(format!("{}/auth/logout", self.base_url))
            .bearer_auth(access_token)
            .send()
            .await?;
        check_status(response).await?;
        self.state.lock().await.renewal = None;
        tracing::info!("Signed out");
        Ok(())
    }
}

async fn read_pair(response: reqwest::Response) -> Result<TokenPair, ClientError> {
    check_status(response)
        .await?
        .json()
        .await
        .map_err(|e| ClientError::Protocol(format!("Unexpected token response: {e}")))
}

/// Delay before renewing a token that lives `expires_in_secs`: a minute
/// early, but never before half its lifetime has passed.
pub fn renew_after(expires_in_secs: i64) -> Duration {
    let lifetime = Duration::from_secs(expires_in_secs.max(0) as u64);
    lifetime.saturating_sub(RENEW_MARGIN).max(lifetime / 2)
}
