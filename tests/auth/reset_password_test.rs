use axum::http::StatusCode;
use serde_json::json;

use crate::common::{extract_token, test_email, test_password, TestContext};

const NEW_PASSWORD: &str = "BrandNewSecret9!";

async fn request_reset(ctx: &TestContext, email: &str) -> axum_test::TestResponse {
    ctx.server
        .post("/auth/forgot-password")
        .json(&json!({ "email": email }))
        .await
}

#[tokio::test]
async fn forgot_password_responses_do_not_reveal_account_existence() {
    let ctx = TestContext::new().await;
    let email = test_email();
    ctx.register_player(&email, None).await;

    let known = request_reset(&ctx, &email).await;
    let unknown = request_reset(&ctx, "nobody@example.com").await;

    known.assert_status(StatusCode::OK);
    unknown.assert_status(StatusCode::OK);

    let a: serde_json::Value = known.json();
    let b: serde_json::Value = unknown.json();
    assert_eq!(a, b);
}

#[tokio::test]
async fn forgot_password_with_invalid_email_returns_bad_request() {
    let ctx = TestContext::new().await;

    request_reset(&ctx, "not-an-email")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    request_reset(&ctx, "")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reset_token_is_stored_hashed() {
    let ctx = TestContext::new().await;
    let email = test_email();
    ctx.register_player(&email, None).await;

    request_reset(&ctx, &email).await;

    let plaintext = extract_token(&ctx.mailbox.last_to(&email).unwrap().body);
    let (stored,): (Option<String>,) =
        sqlx::query_as("SELECT reset_token FROM users WHERE email = ?")
            .bind(&email)
            .fetch_one(&ctx.db)
            .await
            .unwrap();

    let stored = stored.expect("reset token not stored");
    assert_ne!(stored, plaintext);
    assert_eq!(stored.len(), 64, "expected a SHA-256 hex digest");
}

#[tokio::test]
async fn reset_roundtrip_succeeds_exactly_once() {
    let ctx = TestContext::new().await;
    let email = test_email();
    ctx.register_player(&email, None).await;

    request_reset(&ctx, &email).await;
    let token = extract_token(&ctx.mailbox.last_to(&email).unwrap().body);

    // Token checks out
    let verify = ctx
        .server
        .get(&format!("/auth/verify-reset-token/{}", token))
        .await;
    verify.assert_status(StatusCode::OK);
    let body: serde_json::Value = verify.json();
    assert_eq!(body["email"], email);

    // First reset succeeds
    ctx.server
        .post("/auth/reset-password")
        .json(&json!({
            "token": &token,
            "password": NEW_PASSWORD,
            "password_confirm": NEW_PASSWORD
        }))
        .await
        .assert_status(StatusCode::OK);

    // New password works
    ctx.login_token(&email, NEW_PASSWORD).await;

    // Second use of the same token fails
    ctx.server
        .post("/auth/reset-password")
        .json(&json!({
            "token": &token,
            "password": "AnotherSecret10!",
            "password_confirm": "AnotherSecret10!"
        }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn used_token_leaves_the_epoch_marker() {
    let ctx = TestContext::new().await;
    let email = test_email();
    ctx.register_player(&email, None).await;

    request_reset(&ctx, &email).await;
    let token = extract_token(&ctx.mailbox.last_to(&email).unwrap().body);

    ctx.server
        .post("/auth/reset-password")
        .json(&json!({
            "token": &token,
            "password": NEW_PASSWORD,
            "password_confirm": NEW_PASSWORD
        }))
        .await
        .assert_status(StatusCode::OK);

    let (stored, expiry): (Option<String>, Option<chrono::DateTime<chrono::Utc>>) =
        sqlx::query_as("SELECT reset_token, reset_token_expiry FROM users WHERE email = ?")
            .bind(&email)
            .fetch_one(&ctx.db)
            .await
            .unwrap();

    // Deliberate "already used" marker, distinct from "never requested"
    assert_eq!(stored.as_deref(), Some(""));
    assert_eq!(expiry.unwrap().timestamp(), 0);
}

#[tokio::test]
async fn expired_reset_token_is_rejected() {
    let ctx = TestContext::new().await;
    let email = test_email();
    ctx.register_player(&email, None).await;

    request_reset(&ctx, &email).await;
    let token = extract_token(&ctx.mailbox.last_to(&email).unwrap().body);

    sqlx::query("UPDATE users SET reset_token_expiry = ? WHERE email = ?")
        .bind(chrono::Utc::now() - chrono::Duration::minutes(5))
        .bind(&email)
        .execute(&ctx.db)
        .await
        .unwrap();

    ctx.server
        .get(&format!("/auth/verify-reset-token/{}", token))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bogus_token_is_rejected() {
    let ctx = TestContext::new().await;

    ctx.server
        .get(&format!("/auth/verify-reset-token/{}", "ab".repeat(32)))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}
