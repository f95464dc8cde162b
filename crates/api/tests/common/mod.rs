#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use podium_api::auth::jwt::{JwtConfig, RefreshToken};
use podium_api::auth::password::hash_password;
use podium_api::auth::video::VideoConfig;
use podium_api::config::{ServerConfig, TimerConfig};
use podium_api::router::build_app_router;
use podium_api::state::AppState;
use podium_api::ws::WsManager;
use podium_db::models::login::CreateLogin;
use podium_db::models::user::CreateUser;
use podium_db::repositories::{LoginRepo, UserRepo};
use podium_events::EventBus;

/// Password given to every user created by [`create_user`].
pub const TEST_PASSWORD: &str = "test_password_123!";

/// Build a test `ServerConfig` with safe defaults and video enabled.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        heartbeat_interval: Duration::from_secs(30),
        // Tests tick back to back; spacing has its own test.
        timer: TimerConfig {
            min_tick_spacing: Duration::ZERO,
        },
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        },
        video: Some(VideoConfig {
            app_id: "podium-test".to_string(),
            app_secret: "video-secret-for-tests".to_string(),
            token_ttl_mins: 60,
        }),
    }
}

/// Build application state with a fresh WebSocket manager and event bus.
pub fn build_test_state(pool: PgPool, config: ServerConfig) -> AppState {
    AppState {
        pool,
        config: Arc::new(config),
        ws_manager: Arc::new(WsManager::new()),
        event_bus: Arc::new(EventBus::default()),
    }
}

/// Build the full application router over `state`, with the production
/// middleware stack.
pub fn app_with_state(state: AppState) -> Router {
    let config = (*state.config).clone();
    build_app_router(state, &config)
}

/// Build the full application router using the given database pool.
pub fn build_test_app(pool: PgPool) -> Router {
    app_with_state(build_test_state(pool, test_config()))
}

/// Create a user and a login for it directly in the database, returning the
/// user id and an access token for that login.
pub async fn create_user(pool: &PgPool, username: &str) -> (i64, String) {
    let input = CreateUser {
        username: username.to_string(),
        email: format!("{username}@test.com"),
        password_hash: hash_password(TEST_PASSWORD.to_string())
            .await
            .expect("hashing should succeed"),
        role: "debater".to_string(),
    };
    let user = UserRepo::create(pool, &input)
        .await
        .expect("user creation should succeed");

    let jwt = test_config().jwt;
    let refresh = RefreshToken::generate();
    let login = LoginRepo::create(
        pool,
        &CreateLogin {
            user_id: user.id,
            refresh_token_hash: &refresh.hash,
            client_label: Some("test"),
            expires_at: jwt.refresh_expires_at(),
        },
    )
    .await
    .expect("login creation should succeed");

    let token = jwt
        .issue_access_token(user.id, &user.username, login.id)
        .expect("token generation should succeed");
    (user.id, token)
}

/// Create a debate session through the API and return its id.
pub async fn create_session(app: Router, token: &str) -> i64 {
    let body = serde_json::json!({
        "title": "Practice round",
        "motion": "This house would abolish homework",
        "format": "practice",
    });
    let response = post_json_auth(app, "/api/v1/sessions", body, token).await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"]["id"]
        .as_i64()
        .expect("session id")
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Read a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
    token: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request should build");
    app.oneshot(request).await.expect("request should succeed")
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, Some(token)).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body), None).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(body), Some(token)).await
}

/// POST without a body.
pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(token)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some(body), Some(token)).await
}
