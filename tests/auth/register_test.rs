use axum::http::StatusCode;
use serde_json::json;

use crate::common::{test_email, test_password, TestContext};

#[tokio::test]
async fn register_creates_player_account() {
    let ctx = TestContext::new().await;
    let email = test_email();

    let response = ctx
        .server
        .post("/auth/register")
        .json(&json!({
            "name": "Ada",
            "email": &email,
            "password": test_password(),
            "password_confirm": test_password()
        }))
        .await;

    response.assert_status(StatusCode::CREATED);

    let body: serde_json::Value = response.json();
    assert_eq!(body["user"]["email"], email);
    assert_eq!(body["user"]["role"], "player");
    assert_eq!(body["user"]["is_verified"], false);
    assert_eq!(body["user"]["is_active"], true);
}

#[tokio::test]
async fn register_with_mismatched_passwords_returns_bad_request() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/auth/register")
        .json(&json!({
            "name": "Ada",
            "email": test_email(),
            "password": test_password(),
            "password_confirm": "SomethingElse123!"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_with_short_password_returns_bad_request() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/auth/register")
        .json(&json!({
            "name": "Ada",
            "email": test_email(),
            "password": "short",
            "password_confirm": "short"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_with_invalid_email_returns_bad_request() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/auth/register")
        .json(&json!({
            "name": "Ada",
            "email": "not-an-email",
            "password": test_password(),
            "password_confirm": test_password()
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_duplicate_email_returns_conflict() {
    let ctx = TestContext::new().await;
    let email = test_email();
    ctx.register_player(&email, None).await;

    let response = ctx
        .server
        .post("/auth/register")
        .json(&json!({
            "name": "Again",
            "email": &email,
            "password": test_password(),
            "password_confirm": test_password()
        }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn register_duplicate_phone_returns_conflict() {
    let ctx = TestContext::new().await;
    ctx.register_player(&test_email(), Some("+15551230001")).await;

    let response = ctx
        .server
        .post("/auth/register")
        .json(&json!({
            "name": "Again",
            "email": test_email(),
            "phone_number": "+15551230001",
            "password": test_password(),
            "password_confirm": test_password()
        }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn register_email_of_soft_deleted_account_still_conflicts() {
    let ctx = TestContext::new().await;
    let email = test_email();
    let user_id = ctx.insert_user(&email, None, "player").await;
    ctx.soft_delete_user(&user_id).await;

    // Only the invitation path may restore a soft-deleted account
    let response = ctx
        .server
        .post("/auth/register")
        .json(&json!({
            "name": "Back Again",
            "email": &email,
            "password": test_password(),
            "password_confirm": test_password()
        }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
}
