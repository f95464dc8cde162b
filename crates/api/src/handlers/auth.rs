//! Handlers for the `/auth` resource (register, login, refresh, logout).
//!
//! Each successful register or login creates a `logins` row for the calling
//! client. Refresh rotates that row's token in place and logout revokes it,
//! so a host can sign out of one timer tab without ending the others.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use podium_core::error::CoreError;
use podium_core::roles::DEFAULT_ROLE;
use podium_core::types::DbId;
use podium_db::models::login::CreateLogin;
use podium_db::models::user::{CreateUser, User};
use podium_db::repositories::{LoginRepo, UserRepo};
use serde::{Deserialize, Serialize};

use crate::auth::jwt::{hash_refresh_token, RefreshToken};
use crate::auth::password::{check_new_password, hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Maximum consecutive failed login attempts before locking the account.
const MAX_FAILED_ATTEMPTS: i32 = 5;

/// Duration in minutes to lock an account after exceeding failed attempts.
const LOCK_DURATION_MINS: i64 = 15;

/// Accepted username length, in characters.
const USERNAME_LEN: std::ops::RangeInclusive<usize> = 3..=50;

/// Stored client labels are cut to this many characters.
const CLIENT_LABEL_MAX: usize = 100;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/register`.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Names the signing-in client; defaults to the `User-Agent`.
    pub client_label: Option<String>,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    /// Names the signing-in client, e.g. `podium-timer (host)`; defaults to
    /// the `User-Agent`.
    pub client_label: Option<String>,
}

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Successful authentication response returned by register, login and refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserInfo,
}

/// Public user info embedded in [`AuthResponse`].
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub role: String,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/register
///
/// Create a debater account and sign it in. Duplicate usernames or emails
/// are rejected with 409 by the unique constraints.
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let username = input.username.trim();
    if !USERNAME_LEN.contains(&username.chars().count()) {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Username must be between {} and {} characters",
            USERNAME_LEN.start(),
            USERNAME_LEN.end()
        ))));
    }

    let email = input.email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(AppError::Core(CoreError::Validation(
            "Email address is not valid".into(),
        )));
    }

    check_new_password(&input.password, username)?;
    let password_hash = hash_password(input.password).await?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            username: username.to_string(),
            email,
            password_hash,
            role: DEFAULT_ROLE.to_string(),
        },
    )
    .await?;

    tracing::info!(user_id = user.id, username = %user.username, "User registered");

    let label = client_label(input.client_label.as_deref(), &headers);
    let response = sign_in(&state, &user, label.as_deref()).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/v1/auth/login
///
/// Authenticate with username + password. Returns access and refresh tokens.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let user = UserRepo::find_by_username(&state.pool, input.username.trim())
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid username or password".into(),
            ))
        })?;

    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    if let Some(locked_until) = user.locked_until {
        if locked_until > Utc::now() {
            return Err(AppError::Core(CoreError::Forbidden(
                "Account is temporarily locked. Try again later.".into(),
            )));
        }
    }

    let password_valid = verify_password(input.password, user.password_hash.clone()).await?;

    if !password_valid {
        let locked_until = UserRepo::record_failed_login(
            &state.pool,
            user.id,
            MAX_FAILED_ATTEMPTS,
            chrono::Duration::minutes(LOCK_DURATION_MINS),
        )
        .await?;
        if let Some(until) = locked_until {
            tracing::warn!(user_id = user.id, %until, "Account locked after repeated failed logins");
        }

        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid username or password".into(),
        )));
    }

    UserRepo::record_successful_login(&state.pool, user.id).await?;

    let label = client_label(input.client_label.as_deref(), &headers);
    let response = sign_in(&state, &user, label.as_deref()).await?;
    tracing::info!(user_id = user.id, client = ?label, "User signed in");
    Ok(Json(response))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a refresh token for a new access token and a new refresh
/// token on the same login. Each refresh token works once.
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let jwt = &state.config.jwt;
    let next = RefreshToken::generate();

    let login = LoginRepo::rotate(
        &state.pool,
        &hash_refresh_token(&input.refresh_token),
        &next.hash,
        jwt.refresh_expires_at(),
    )
    .await?
    .ok_or_else(|| {
        AppError::Core(CoreError::Unauthorized(
            "Invalid or expired refresh token".into(),
        ))
    })?;

    let user = UserRepo::find_by_id(&state.pool, login.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;

    if !user.is_active {
        LoginRepo::revoke(&state.pool, login.id, user.id).await?;
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    tracing::debug!(user_id = user.id, login_id = login.id, "Refresh token rotated");
    Ok(Json(auth_response(&state, &user, login.id, next.plaintext)?))
}

/// POST /api/v1/auth/logout
///
/// Sign out the login behind the caller's access token. Other clients of
/// the same user stay signed in. Returns 204 No Content.
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> AppResult<StatusCode> {
    let revoked = LoginRepo::revoke(&state.pool, auth.login_id, auth.user_id).await?;
    tracing::info!(
        user_id = auth.user_id,
        login_id = auth.login_id,
        revoked,
        "User signed out"
    );
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Label stored on the login: the request's own label, else `User-Agent`.
fn client_label(requested: Option<&str>, headers: &HeaderMap) -> Option<String> {
    requested
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .or_else(|| {
            headers
                .get(axum::http::header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
        })
        .map(|label| label.chars().take(CLIENT_LABEL_MAX).collect())
}

/// Create a login for `user` and issue its first token pair.
async fn sign_in(state: &AppState, user: &User, label: Option<&str>) -> AppResult<AuthResponse> {
    let refresh = RefreshToken::generate();
    let login = LoginRepo::create(
        &state.pool,
        &CreateLogin {
            user_id: user.id,
            refresh_token_hash: &refresh.hash,
            client_label: label,
            expires_at: state.config.jwt.refresh_expires_at(),
        },
    )
    .await?;

    auth_response(state, user, login.id, refresh.plaintext)
}

fn auth_response(
    state: &AppState,
    user: &User,
    login_id: DbId,
    refresh_token: String,
) -> AppResult<AuthResponse> {
    let jwt = &state.config.jwt;
    let access_token = jwt
        .issue_access_token(user.id, &user.username, login_id)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    Ok(AuthResponse {
        access_token,
        refresh_token,
        expires_in: jwt.access_ttl_secs(),
        user: UserInfo::from(user),
    })
}
