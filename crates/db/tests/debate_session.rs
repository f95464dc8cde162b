//! Integration tests for debate sessions and their persisted timer.
//!
//! Exercises the repository layer against a real database:
//! - Conditional timer writes (host only, sequence checked, tick spacing)
//! - Schema CHECK constraints on the timer columns
//! - Ending a session
//! - Participant join / leave / re-join

use podium_core::timer::{SessionTimer, TimerCommand};
use podium_db::models::debate_session::CreateDebateSession;
use podium_db::models::user::CreateUser;
use podium_db::repositories::{
    DebateSessionRepo, ParticipantRepo, SessionEventRepo, UserRepo,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn create_user(pool: &PgPool, username: &str) -> i64 {
    let input = CreateUser {
        username: username.to_string(),
        email: format!("{username}@test.com"),
        password_hash: "not-a-real-hash".to_string(),
        role: "debater".to_string(),
    };
    UserRepo::create(pool, &input).await.unwrap().id
}

async fn create_session(pool: &PgPool, host_user_id: i64, room: &str) -> i64 {
    let input = CreateDebateSession {
        title: "Practice round".to_string(),
        motion: Some("This house would ban homework".to_string()),
        format: "practice".to_string(),
        host_user_id,
        room_name: room.to_string(),
    };
    DebateSessionRepo::create(pool, &input).await.unwrap().id
}

fn applied(timer: SessionTimer, command: TimerCommand) -> SessionTimer {
    timer.apply(command).unwrap().timer
}

// ---------------------------------------------------------------------------
// Timer writes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn new_session_has_idle_timer(pool: PgPool) {
    let host = create_user(&pool, "host").await;
    let id = create_session(&pool, host, "podium-a").await;

    let row = DebateSessionRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(row.timer_duration_seconds, 0);
    assert_eq!(row.timer_remaining_seconds, 0);
    assert!(!row.timer_is_running);
    assert_eq!(row.timer_seq, 0);
    assert!(!row.has_ended());
}

#[sqlx::test(migrations = "./migrations")]
async fn write_timer_bumps_seq(pool: PgPool) {
    let host = create_user(&pool, "host").await;
    let id = create_session(&pool, host, "podium-a").await;

    let timer = applied(SessionTimer::new(), TimerCommand::Set { minutes: 2, seconds: 30 });
    let row = DebateSessionRepo::write_timer(&pool, id, host, 0, &timer, None)
        .await
        .unwrap()
        .expect("host write with current seq should land");

    assert_eq!(row.timer_duration_seconds, 150);
    assert_eq!(row.timer_remaining_seconds, 150);
    assert_eq!(row.timer_seq, 1);
    assert_eq!(row.timer().unwrap(), timer);

    let running = applied(timer, TimerCommand::Start);
    let row = DebateSessionRepo::write_timer(&pool, id, host, 1, &running, None)
        .await
        .unwrap()
        .unwrap();
    assert!(row.timer_is_running);
    assert_eq!(row.timer_seq, 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn write_timer_rejects_stale_seq(pool: PgPool) {
    let host = create_user(&pool, "host").await;
    let id = create_session(&pool, host, "podium-a").await;

    let timer = applied(SessionTimer::new(), TimerCommand::Set { minutes: 1, seconds: 0 });
    DebateSessionRepo::write_timer(&pool, id, host, 0, &timer, None)
        .await
        .unwrap()
        .unwrap();

    // A second writer that still believes seq is 0 loses.
    let other = applied(SessionTimer::new(), TimerCommand::Set { minutes: 5, seconds: 0 });
    let result = DebateSessionRepo::write_timer(&pool, id, host, 0, &other, None)
        .await
        .unwrap();
    assert!(result.is_none());

    let row = DebateSessionRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(row.timer_duration_seconds, 60);
    assert_eq!(row.timer_seq, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn write_timer_rejects_non_host(pool: PgPool) {
    let host = create_user(&pool, "host").await;
    let intruder = create_user(&pool, "intruder").await;
    let id = create_session(&pool, host, "podium-a").await;

    let timer = applied(SessionTimer::new(), TimerCommand::Set { minutes: 1, seconds: 0 });
    let result = DebateSessionRepo::write_timer(&pool, id, intruder, 0, &timer, None)
        .await
        .unwrap();
    assert!(result.is_none());

    let row = DebateSessionRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(row.timer_seq, 0);
    assert_eq!(row.timer_duration_seconds, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn write_timer_refuses_tick_too_soon_after_previous_write(pool: PgPool) {
    let host = create_user(&pool, "host").await;
    let id = create_session(&pool, host, "podium-a").await;

    let timer = applied(SessionTimer::new(), TimerCommand::Set { minutes: 0, seconds: 10 });
    DebateSessionRepo::write_timer(&pool, id, host, 0, &timer, None)
        .await
        .unwrap()
        .unwrap();
    let running = applied(timer, TimerCommand::Start);
    DebateSessionRepo::write_timer(&pool, id, host, 1, &running, None)
        .await
        .unwrap()
        .unwrap();

    // The start just landed, so a tick that demands a minute of spacing loses.
    let ticked = applied(running, TimerCommand::Tick);
    let early = DebateSessionRepo::write_timer(&pool, id, host, 2, &ticked, Some(60_000))
        .await
        .unwrap();
    assert!(early.is_none());

    let row = DebateSessionRepo::write_timer(&pool, id, host, 2, &ticked, Some(0))
        .await
        .unwrap()
        .expect("tick with no spacing requirement should land");
    assert_eq!(row.timer_remaining_seconds, 9);
    assert_eq!(row.timer_seq, 3);
}

#[sqlx::test(migrations = "./migrations")]
async fn schema_rejects_running_timer_without_time(pool: PgPool) {
    let host = create_user(&pool, "host").await;
    let id = create_session(&pool, host, "podium-a").await;

    let result = sqlx::query(
        "UPDATE debate_sessions SET timer_duration_seconds = 10, \
         timer_remaining_seconds = 0, timer_is_running = true WHERE id = $1",
    )
    .bind(id)
    .execute(&pool)
    .await;
    assert!(result.is_err());

    let result = sqlx::query(
        "UPDATE debate_sessions SET timer_duration_seconds = 10, \
         timer_remaining_seconds = 11 WHERE id = $1",
    )
    .bind(id)
    .execute(&pool)
    .await;
    assert!(result.is_err());
}

// ---------------------------------------------------------------------------
// Ending
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn end_stops_running_timer(pool: PgPool) {
    let host = create_user(&pool, "host").await;
    let id = create_session(&pool, host, "podium-a").await;

    let timer = applied(SessionTimer::new(), TimerCommand::Set { minutes: 1, seconds: 0 });
    let running = applied(timer, TimerCommand::Start);
    DebateSessionRepo::write_timer(&pool, id, host, 0, &timer, None)
        .await
        .unwrap()
        .unwrap();
    DebateSessionRepo::write_timer(&pool, id, host, 1, &running, None)
        .await
        .unwrap()
        .unwrap();

    let ended = DebateSessionRepo::end(&pool, id, host).await.unwrap().unwrap();
    assert!(ended.has_ended());
    assert!(!ended.timer_is_running);
    assert_eq!(ended.timer_seq, 3);

    // Ending twice is rejected, as is any timer write afterwards.
    assert!(DebateSessionRepo::end(&pool, id, host).await.unwrap().is_none());
    let after = DebateSessionRepo::write_timer(&pool, id, host, 3, &running, None)
        .await
        .unwrap();
    assert!(after.is_none());

    let active = DebateSessionRepo::list_active(&pool, 20, 0).await.unwrap();
    assert!(active.iter().all(|s| s.id != id));
}

#[sqlx::test(migrations = "./migrations")]
async fn end_rejects_non_host(pool: PgPool) {
    let host = create_user(&pool, "host").await;
    let other = create_user(&pool, "other").await;
    let id = create_session(&pool, host, "podium-a").await;

    assert!(DebateSessionRepo::end(&pool, id, other).await.unwrap().is_none());
    let row = DebateSessionRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert!(!row.has_ended());
}

#[sqlx::test(migrations = "./migrations")]
async fn room_names_are_unique(pool: PgPool) {
    let host = create_user(&pool, "host").await;
    create_session(&pool, host, "podium-a").await;

    let dup = CreateDebateSession {
        title: "Again".to_string(),
        motion: None,
        format: "practice".to_string(),
        host_user_id: host,
        room_name: "podium-a".to_string(),
    };
    let err = DebateSessionRepo::create(&pool, &dup).await.unwrap_err();
    match err {
        sqlx::Error::Database(db_err) => {
            assert_eq!(db_err.constraint(), Some("uq_debate_sessions_room_name"));
        }
        other => panic!("expected database error, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Participants
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn participant_join_leave_rejoin(pool: PgPool) {
    let host = create_user(&pool, "host").await;
    let guest = create_user(&pool, "guest").await;
    let id = create_session(&pool, host, "podium-a").await;

    ParticipantRepo::join(&pool, id, host, "host").await.unwrap();
    let joined = ParticipantRepo::join(&pool, id, guest, "observer").await.unwrap();
    assert!(joined.is_present());

    let present = ParticipantRepo::list_for_session(&pool, id).await.unwrap();
    assert_eq!(present.len(), 2);

    assert!(ParticipantRepo::leave(&pool, id, guest).await.unwrap());
    assert!(!ParticipantRepo::leave(&pool, id, guest).await.unwrap());
    let present = ParticipantRepo::list_for_session(&pool, id).await.unwrap();
    assert_eq!(present.len(), 1);

    let rejoined = ParticipantRepo::join(&pool, id, guest, "judge").await.unwrap();
    assert_eq!(rejoined.id, joined.id);
    assert_eq!(rejoined.role, "judge");
    assert!(rejoined.is_present());
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn session_events_are_listed_in_order(pool: PgPool) {
    let host = create_user(&pool, "host").await;
    let id = create_session(&pool, host, "podium-a").await;

    let payload = serde_json::json!({ "seq": 1 });
    SessionEventRepo::insert(&pool, "timer.updated", Some(id), Some(host), &payload)
        .await
        .unwrap();
    SessionEventRepo::insert(&pool, "timer.expired", Some(id), None, &serde_json::json!({}))
        .await
        .unwrap();

    let events = SessionEventRepo::list_for_session(&pool, id, 10).await.unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event_type, "timer.updated");
    assert_eq!(events[0].payload["seq"], 1);
    assert_eq!(events[1].event_type, "timer.expired");
}
