//! Room tokens for the external video conferencing provider.
//!
//! Each debate session owns a video room named after its `room_name`. The
//! provider admits a participant that presents an HS256 JWT signed with the
//! shared application secret. Only token issuance lives here; media is
//! handled entirely by the provider.

use jsonwebtoken::{encode, EncodingKey, Header};
use podium_core::types::DbId;
use serde::{Deserialize, Serialize};

use crate::config::env_or;

/// Default room token lifetime in minutes.
const DEFAULT_TOKEN_TTL_MINS: i64 = 60;

/// Credentials issued by the video provider.
#[derive(Debug, Clone)]
pub struct VideoConfig {
    pub app_id: String,
    pub app_secret: String,
    pub token_ttl_mins: i64,
}

impl VideoConfig {
    /// Load video credentials from the environment.
    ///
    /// | Env Var                | Required | Default |
    /// |------------------------|----------|---------|
    /// | `VIDEO_APP_ID`         | no       | --      |
    /// | `VIDEO_APP_SECRET`     | no       | --      |
    /// | `VIDEO_TOKEN_TTL_MINS` | no       | `60`    |
    ///
    /// Returns `None` unless both the id and the secret are set and non-empty.
    pub fn from_env() -> Option<Self> {
        let app_id = std::env::var("VIDEO_APP_ID").ok().filter(|v| !v.is_empty())?;
        let app_secret = std::env::var("VIDEO_APP_SECRET")
            .ok()
            .filter(|v| !v.is_empty())?;

        Some(Self {
            app_id,
            app_secret,
            token_ttl_mins: env_or("VIDEO_TOKEN_TTL_MINS", DEFAULT_TOKEN_TTL_MINS),
        })
    }
}

/// Claims the video provider expects in a room token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RoomClaims {
    /// Issuer: the provider application id.
    pub iss: String,
    /// Subject: the joining user's id, as a string.
    pub sub: String,
    pub room: String,
    /// Moderators may mute and remove other participants.
    pub moderator: bool,
    pub iat: i64,
    pub exp: i64,
}

/// A signed room token and its expiry.
#[derive(Debug, Serialize)]
pub struct RoomToken {
    pub token: String,
    pub room: String,
    pub expires_at: i64,
}

/// Sign a room token for `user_id` joining `room`.
pub fn generate_room_token(
    user_id: DbId,
    room: &str,
    moderator: bool,
    config: &VideoConfig,
) -> Result<RoomToken, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let exp = now + config.token_ttl_mins * 60;

    let claims = RoomClaims {
        iss: config.app_id.clone(),
        sub: user_id.to_string(),
        room: room.to_string(),
        moderator,
        iat: now,
        exp,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.app_secret.as_bytes()),
    )?;

    Ok(RoomToken {
        token,
        room: room.to_string(),
        expires_at: exp,
    })
}
