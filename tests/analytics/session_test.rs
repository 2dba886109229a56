use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde_json::json;

use crate::common::{test_email, test_password, TestContext};

async fn player_token(ctx: &TestContext) -> String {
    let email = test_email();
    ctx.insert_user(&email, None, "player").await;
    ctx.login_token(&email, test_password()).await.1
}

#[tokio::test]
async fn starting_a_session_persists_the_row_out_of_band() {
    let ctx = TestContext::new().await;
    let token = player_token(&ctx).await;
    let game = ctx.insert_game("Async Arcade", "arcade").await;

    let response = ctx
        .server
        .post("/analytics/sessions")
        .authorization_bearer(&token)
        .json(&json!({ "game_id": game, "activity_type": "gameplay" }))
        .await;

    response.assert_status(StatusCode::ACCEPTED);
    let body: serde_json::Value = response.json();
    let session_id = body["session_id"].as_str().unwrap().to_string();

    // The insert happens on the job queue, not in the request
    ctx.wait_for_count(
        "SELECT COUNT(*) FROM game_sessions WHERE id = ?",
        &session_id,
        1,
    )
    .await;
}

#[tokio::test]
async fn ending_a_session_derives_its_duration() {
    let ctx = TestContext::new().await;
    let token = player_token(&ctx).await;
    let game = ctx.insert_game("Timed Trials", "racing").await;

    let start: serde_json::Value = ctx
        .server
        .post("/analytics/sessions")
        .authorization_bearer(&token)
        .json(&json!({ "game_id": game, "activity_type": "gameplay" }))
        .await
        .json();
    let session_id = start["session_id"].as_str().unwrap().to_string();

    ctx.wait_for_count(
        "SELECT COUNT(*) FROM game_sessions WHERE id = ?",
        &session_id,
        1,
    )
    .await;

    ctx.server
        .post(&format!("/analytics/sessions/{}/end", session_id))
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::ACCEPTED);

    ctx.wait_for_count(
        "SELECT COUNT(*) FROM game_sessions WHERE id = ? AND ended_at IS NOT NULL",
        &session_id,
        1,
    )
    .await;

    let (started_at, ended_at, duration): (
        DateTime<Utc>,
        DateTime<Utc>,
        i64,
    ) = sqlx::query_as(
        "SELECT started_at, ended_at, duration_seconds FROM game_sessions WHERE id = ?",
    )
    .bind(&session_id)
    .fetch_one(&ctx.db)
    .await
    .unwrap();

    assert_eq!(duration, (ended_at - started_at).num_seconds());
}

#[tokio::test]
async fn starting_a_session_for_an_unknown_game_is_a_not_found() {
    let ctx = TestContext::new().await;
    let token = player_token(&ctx).await;

    ctx.server
        .post("/analytics/sessions")
        .authorization_bearer(&token)
        .json(&json!({
            "game_id": uuid::Uuid::new_v4().to_string(),
            "activity_type": "gameplay"
        }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn session_endpoints_require_authentication() {
    let ctx = TestContext::new().await;
    let game = ctx.insert_game("Locked Game", "arcade").await;

    ctx.server
        .post("/analytics/sessions")
        .json(&json!({ "game_id": game, "activity_type": "gameplay" }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}
