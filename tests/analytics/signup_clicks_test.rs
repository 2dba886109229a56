use axum::http::StatusCode;
use chrono::Utc;
use serde_json::json;

use crate::common::{test_email, test_password, TestContext};

async fn post_click(ctx: &TestContext, session_id: &str, source: &str) {
    let response = ctx
        .server
        .post("/analytics/signup-clicks")
        .add_header("x-forwarded-for", "203.0.113.9")
        .json(&json!({
            "session_id": session_id,
            "device_type": "desktop",
            "source": source
        }))
        .await;
    response.assert_status(StatusCode::ACCEPTED);
}

async fn insert_click_directly(ctx: &TestContext, source: &str) {
    sqlx::query(
        r#"
        INSERT INTO signup_clicks (id, session_id, ip_address, country, device_type, source, created_at)
        VALUES (?, ?, '198.51.100.7', 'Unknown', 'mobile', ?, ?)
        "#,
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(source)
    .bind(Utc::now())
    .execute(&ctx.db)
    .await
    .unwrap();
}

#[tokio::test]
async fn clicks_are_recorded_with_ip_and_resolved_country() {
    let ctx = TestContext::new().await;
    let session_id = uuid::Uuid::new_v4().to_string();

    post_click(&ctx, &session_id, "hero").await;

    ctx.wait_for_count(
        "SELECT COUNT(*) FROM signup_clicks WHERE session_id = ?",
        &session_id,
        1,
    )
    .await;

    let (ip, country): (String, String) =
        sqlx::query_as("SELECT ip_address, country FROM signup_clicks WHERE session_id = ?")
            .bind(&session_id)
            .fetch_one(&ctx.db)
            .await
            .unwrap();

    assert_eq!(ip, "203.0.113.9");
    // No geo-IP database configured in tests
    assert_eq!(country, "Unknown");
}

#[tokio::test]
async fn summary_is_cached_until_a_new_click_arrives() {
    let ctx = TestContext::new().await;
    let (_, token) = ctx.admin_token().await;

    let first = uuid::Uuid::new_v4().to_string();
    post_click(&ctx, &first, "hero").await;
    ctx.wait_for_count(
        "SELECT COUNT(*) FROM signup_clicks WHERE session_id = ?",
        &first,
        1,
    )
    .await;

    let summary: serde_json::Value = ctx
        .server
        .get("/analytics/signup-clicks/summary")
        .authorization_bearer(&token)
        .await
        .json();
    assert_eq!(summary["total"], 1);

    // A write that bypasses the API does not invalidate the cache
    insert_click_directly(&ctx, "footer").await;
    let cached: serde_json::Value = ctx
        .server
        .get("/analytics/signup-clicks/summary")
        .authorization_bearer(&token)
        .await
        .json();
    assert_eq!(cached["total"], 1, "stale summary should come from the cache");

    // An API write invalidates the whole namespace
    let second = uuid::Uuid::new_v4().to_string();
    post_click(&ctx, &second, "navbar").await;
    ctx.wait_for_count(
        "SELECT COUNT(*) FROM signup_clicks WHERE session_id = ?",
        &second,
        1,
    )
    .await;

    let fresh: serde_json::Value = ctx
        .server
        .get("/analytics/signup-clicks/summary")
        .authorization_bearer(&token)
        .await
        .json();
    assert_eq!(fresh["total"], 3);
}

#[tokio::test]
async fn summary_groups_by_source() {
    let ctx = TestContext::new().await;
    let (_, token) = ctx.admin_token().await;

    for source in ["hero", "hero", "footer"] {
        let session = uuid::Uuid::new_v4().to_string();
        post_click(&ctx, &session, source).await;
        ctx.wait_for_count(
            "SELECT COUNT(*) FROM signup_clicks WHERE session_id = ?",
            &session,
            1,
        )
        .await;
    }

    let summary: serde_json::Value = ctx
        .server
        .get("/analytics/signup-clicks/summary")
        .authorization_bearer(&token)
        .await
        .json();

    assert_eq!(summary["total"], 3);
    let by_source = summary["by_source"].as_array().unwrap();
    assert_eq!(by_source[0]["key"], "hero");
    assert_eq!(by_source[0]["count"], 2);
    assert_eq!(by_source[1]["key"], "footer");
    assert_eq!(by_source[1]["count"], 1);
}

#[tokio::test]
async fn summary_requires_an_admin() {
    let ctx = TestContext::new().await;

    ctx.server
        .get("/analytics/signup-clicks/summary")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let email = test_email();
    ctx.insert_user(&email, None, "player").await;
    let (_, token) = ctx.login_token(&email, test_password()).await;

    ctx.server
        .get("/analytics/signup-clicks/summary")
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}
