//! HTTP-level integration tests for the auth endpoints.
//!
//! Covers registration, login, token refresh with rotation, per-client
//! logout, and account lockout.

mod common;

use axum::http::StatusCode;
use common::{body_json, get_auth, post_auth, post_json, TEST_PASSWORD};
use sqlx::PgPool;

async fn login(app: axum::Router, username: &str, password: &str) -> axum::response::Response {
    let body = serde_json::json!({ "username": username, "password": password });
    post_json(app, "/api/v1/auth/login", body).await
}

#[sqlx::test(migrations = "../db/migrations")]
async fn register_creates_debater_and_signs_in(pool: PgPool) {
    let app = common::build_test_app(pool);

    let body = serde_json::json!({
        "username": "newdebater",
        "email": "NewDebater@Example.com",
        "password": "long-enough-password",
    });
    let response = post_json(app.clone(), "/api/v1/auth/register", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert!(json["access_token"].is_string());
    assert!(json["refresh_token"].is_string());
    assert_eq!(json["expires_in"], 900);
    assert_eq!(json["user"]["username"], "newdebater");
    assert_eq!(json["user"]["email"], "newdebater@example.com");
    assert_eq!(json["user"]["role"], "debater");

    // The issued access token works against an authenticated endpoint.
    let token = json["access_token"].as_str().unwrap();
    let response = get_auth(app, "/api/v1/sessions", token).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn register_rejects_short_password(pool: PgPool) {
    let app = common::build_test_app(pool);

    let body = serde_json::json!({
        "username": "shorty",
        "email": "shorty@example.com",
        "password": "1234567",
    });
    let response = post_json(app, "/api/v1/auth/register", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn register_duplicate_username_conflicts(pool: PgPool) {
    common::create_user(&pool, "taken").await;
    let app = common::build_test_app(pool);

    let body = serde_json::json!({
        "username": "taken",
        "email": "other@example.com",
        "password": "long-enough-password",
    });
    let response = post_json(app, "/api/v1/auth/register", body).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn login_success_and_wrong_password(pool: PgPool) {
    let (user_id, _) = common::create_user(&pool, "loginuser").await;
    let app = common::build_test_app(pool);

    let response = login(app.clone(), "loginuser", TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["user"]["id"], user_id);

    let response = login(app, "loginuser", "incorrect_password").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn five_failed_logins_lock_the_account(pool: PgPool) {
    common::create_user(&pool, "lockme").await;
    let app = common::build_test_app(pool);

    for _ in 0..5 {
        let response = login(app.clone(), "lockme", "wrong-password").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // Even the correct password is refused while locked.
    let response = login(app, "lockme", TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn refresh_rotates_the_token(pool: PgPool) {
    common::create_user(&pool, "refresher").await;
    let app = common::build_test_app(pool);

    let json = body_json(login(app.clone(), "refresher", TEST_PASSWORD).await).await;
    let refresh_token = json["refresh_token"].as_str().unwrap().to_string();

    let body = serde_json::json!({ "refresh_token": refresh_token });
    let response = post_json(app.clone(), "/api/v1/auth/refresh", body.clone()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let rotated = body_json(response).await;
    assert_ne!(rotated["refresh_token"], refresh_token);

    // The old refresh token was revoked by the rotation.
    let response = post_json(app, "/api/v1/auth/refresh", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn logout_signs_out_only_the_calling_client(pool: PgPool) {
    common::create_user(&pool, "leaver").await;
    let app = common::build_test_app(pool);

    let host_tab = body_json(login(app.clone(), "leaver", TEST_PASSWORD).await).await;
    let timer = body_json(login(app.clone(), "leaver", TEST_PASSWORD).await).await;

    let access = host_tab["access_token"].as_str().unwrap();
    let response = post_auth(app.clone(), "/api/v1/auth/logout", access).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let body = serde_json::json!({ "refresh_token": host_tab["refresh_token"] });
    let response = post_json(app.clone(), "/api/v1/auth/refresh", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The timer client's login is untouched.
    let body = serde_json::json!({ "refresh_token": timer["refresh_token"] });
    let response = post_json(app, "/api/v1/auth/refresh", body).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn timer_client_login_keeps_its_label_and_login_across_refresh(pool: PgPool) {
    common::create_user(&pool, "timekeeper").await;
    let app = common::build_test_app(pool.clone());
    let jwt = common::test_config().jwt;

    let body = serde_json::json!({
        "username": "timekeeper",
        "password": TEST_PASSWORD,
        "client_label": "podium-timer (host)",
    });
    let signed_in = body_json(post_json(app.clone(), "/api/v1/auth/login", body).await).await;
    let claims = jwt
        .verify_access_token(signed_in["access_token"].as_str().unwrap())
        .unwrap();
    assert_eq!(claims.name, "timekeeper");

    let body = serde_json::json!({ "refresh_token": signed_in["refresh_token"] });
    let refreshed = body_json(post_json(app, "/api/v1/auth/refresh", body).await).await;
    let renewed = jwt
        .verify_access_token(refreshed["access_token"].as_str().unwrap())
        .unwrap();
    assert_eq!(renewed.lid, claims.lid);

    let label: Option<String> = sqlx::query_scalar("SELECT client_label FROM logins WHERE id = $1")
        .bind(claims.lid)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(label.as_deref(), Some("podium-timer (host)"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn register_rejects_username_as_password(pool: PgPool) {
    let app = common::build_test_app(pool);

    let body = serde_json::json!({
        "username": "chairperson",
        "email": "chair@example.com",
        "password": "ChairPerson",
    });
    let response = post_json(app, "/api/v1/auth/register", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn missing_bearer_token_is_401(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = common::get(app, "/api/v1/sessions").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
}
