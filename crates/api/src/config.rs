//! Server configuration, read once at startup.
//!
//! | Env Var                     | Default                 |
//! |-----------------------------|-------------------------|
//! | `HOST`                      | `0.0.0.0`               |
//! | `PORT`                      | `3000`                  |
//! | `CORS_ORIGINS`              | `http://localhost:5173` |
//! | `REQUEST_TIMEOUT_SECS`      | `30`                    |
//! | `SHUTDOWN_TIMEOUT_SECS`     | `30`                    |
//! | `WS_HEARTBEAT_SECS`         | `30`                    |
//! | `TIMER_MIN_TICK_SPACING_MS` | `900`                   |
//!
//! Token settings are read by [`JwtConfig::from_env`] and
//! [`VideoConfig::from_env`].

use std::str::FromStr;
use std::time::Duration;

use podium_core::timer::MIN_TICK_SPACING;

use crate::auth::jwt::JwtConfig;
use crate::auth::video::VideoConfig;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Browser origins allowed to call the API (comma-separated in the env).
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// Upper bound on each post-shutdown drain step.
    pub shutdown_timeout_secs: u64,
    /// How often timer subscribers are pinged so proxies keep idle sockets open.
    pub heartbeat_interval: Duration,
    pub timer: TimerConfig,
    pub jwt: JwtConfig,
    /// `None` disables room token issuance.
    pub video: Option<VideoConfig>,
}

/// Rules applied to every timer write.
#[derive(Debug, Clone)]
pub struct TimerConfig {
    /// Shortest accepted gap between the previous timer write and a tick.
    /// Zero turns the check off.
    pub min_tick_spacing: Duration,
}

impl TimerConfig {
    /// Spacing in whole milliseconds, as the timer UPDATE binds it.
    pub fn min_tick_spacing_ms(&self) -> i64 {
        i64::try_from(self.min_tick_spacing.as_millis()).unwrap_or(i64::MAX)
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            min_tick_spacing: MIN_TICK_SPACING,
        }
    }
}

impl ServerConfig {
    /// # Panics
    ///
    /// Panics when a variable is set but does not parse, or when
    /// `JWT_SECRET` is missing.
    pub fn from_env() -> Self {
        let cors_origins = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let default_spacing = TimerConfig::default().min_tick_spacing.as_millis() as u64;

        Self {
            host: env_or("HOST", "0.0.0.0".to_string()),
            port: env_or("PORT", 3000),
            cors_origins,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30),
            shutdown_timeout_secs: env_or("SHUTDOWN_TIMEOUT_SECS", 30),
            heartbeat_interval: Duration::from_secs(env_or("WS_HEARTBEAT_SECS", 30)),
            timer: TimerConfig {
                min_tick_spacing: Duration::from_millis(env_or(
                    "TIMER_MIN_TICK_SPACING_MS",
                    default_spacing,
                )),
            },
            jwt: JwtConfig::from_env(),
            video: VideoConfig::from_env(),
        }
    }
}

/// Parse `name` from the environment, falling back to `default` when unset.
///
/// # Panics
///
/// Panics when the variable is set but does not parse as `T`.
pub(crate) fn env_or<T: FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            panic!("{name} must be a valid {}", std::any::type_name::<T>())
        }),
        Err(_) => default,
    }
}
