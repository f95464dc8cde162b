//! HTTP-level integration tests for debate sessions and participants.

mod common;

use axum::http::StatusCode;
use common::{body_json, get_auth, post_auth, post_json_auth};
use podium_api::auth::video::RoomClaims;
use sqlx::PgPool;

#[sqlx::test(migrations = "../db/migrations")]
async fn create_session_makes_caller_host(pool: PgPool) {
    let (host_id, token) = common::create_user(&pool, "host").await;
    let app = common::build_test_app(pool);

    let body = serde_json::json!({
        "title": "  Semi-final  ",
        "motion": "This house regrets social media",
        "format": "world_schools",
    });
    let response = post_json_auth(app.clone(), "/api/v1/sessions", body, &token).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    let session = &json["data"];
    assert_eq!(session["title"], "Semi-final");
    assert_eq!(session["host_user_id"], host_id);
    assert!(session["room_name"].as_str().unwrap().starts_with("podium-"));
    assert_eq!(session["timer_duration_seconds"], 0);
    assert_eq!(session["timer_seq"], 0);

    let id = session["id"].as_i64().unwrap();
    let response = get_auth(app, &format!("/api/v1/sessions/{id}/participants"), &token).await;
    let json = body_json(response).await;
    let participants = json["data"].as_array().unwrap();
    assert_eq!(participants.len(), 1);
    assert_eq!(participants[0]["role"], "host");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_session_validates_format(pool: PgPool) {
    let (_, token) = common::create_user(&pool, "host").await;
    let app = common::build_test_app(pool);

    let body = serde_json::json!({ "title": "Round", "format": "cage_match" });
    let response = post_json_auth(app, "/api/v1/sessions", body, &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn get_unknown_session_is_404(pool: PgPool) {
    let (_, token) = common::create_user(&pool, "host").await;
    let app = common::build_test_app(pool);

    let response = get_auth(app, "/api/v1/sessions/999999", &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn join_leave_and_list(pool: PgPool) {
    let (_, host) = common::create_user(&pool, "host").await;
    let (_, judge) = common::create_user(&pool, "judge").await;
    let app = common::build_test_app(pool);
    let id = common::create_session(app.clone(), &host).await;

    let body = serde_json::json!({ "role": "judge" });
    let response = post_json_auth(app.clone(), &format!("/api/v1/sessions/{id}/join"), body, &judge).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["role"], "judge");

    let response = get_auth(app.clone(), &format!("/api/v1/sessions/{id}/participants"), &judge).await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 2);

    let response = post_auth(app.clone(), &format!("/api/v1/sessions/{id}/leave"), &judge).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = post_auth(app.clone(), &format!("/api/v1/sessions/{id}/leave"), &judge).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The host cannot leave or join.
    let response = post_auth(app.clone(), &format!("/api/v1/sessions/{id}/leave"), &host).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = serde_json::json!({ "role": "observer" });
    let response = post_json_auth(app, &format!("/api/v1/sessions/{id}/join"), body, &host).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn join_as_host_is_rejected(pool: PgPool) {
    let (_, host) = common::create_user(&pool, "host").await;
    let (_, other) = common::create_user(&pool, "other").await;
    let app = common::build_test_app(pool);
    let id = common::create_session(app.clone(), &host).await;

    let body = serde_json::json!({ "role": "host" });
    let response = post_json_auth(app, &format!("/api/v1/sessions/{id}/join"), body, &other).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn only_host_can_end(pool: PgPool) {
    let (_, host) = common::create_user(&pool, "host").await;
    let (_, other) = common::create_user(&pool, "other").await;
    let app = common::build_test_app(pool);
    let id = common::create_session(app.clone(), &host).await;

    let response = post_auth(app.clone(), &format!("/api/v1/sessions/{id}/end"), &other).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_auth(app.clone(), &format!("/api/v1/sessions/{id}/end"), &host).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["data"]["ended_at"].is_string());

    let response = post_auth(app.clone(), &format!("/api/v1/sessions/{id}/end"), &host).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Ended sessions drop out of the active list.
    let response = get_auth(app, "/api/v1/sessions", &host).await;
    let json = body_json(response).await;
    assert!(json["data"].as_array().unwrap().iter().all(|s| s["id"] != id));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn video_token_for_participants_only(pool: PgPool) {
    let (host_id, host) = common::create_user(&pool, "host").await;
    let (_, outsider) = common::create_user(&pool, "outsider").await;
    let app = common::build_test_app(pool);
    let id = common::create_session(app.clone(), &host).await;

    let uri = format!("/api/v1/sessions/{id}/video-token");
    let response = post_auth(app.clone(), &uri, &outsider).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_auth(app, &uri, &host).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let token = json["data"]["token"].as_str().unwrap();

    let claims = jsonwebtoken::decode::<RoomClaims>(
        token,
        &jsonwebtoken::DecodingKey::from_secret(b"video-secret-for-tests"),
        &jsonwebtoken::Validation::default(),
    )
    .unwrap()
    .claims;
    assert_eq!(claims.sub, host_id.to_string());
    assert!(claims.moderator);
    assert_eq!(claims.room, json["data"]["room"].as_str().unwrap());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn video_token_without_configuration_is_400(pool: PgPool) {
    let (_, host) = common::create_user(&pool, "host").await;
    let mut config = common::test_config();
    config.video = None;
    let app = common::app_with_state(common::build_test_state(pool, config));
    let id = common::create_session(app.clone(), &host).await;

    let response = post_auth(app, &format!("/api/v1/sessions/{id}/video-token"), &host).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Video conferencing is not configured");
}
