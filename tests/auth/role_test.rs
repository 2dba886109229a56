use axum::http::StatusCode;
use serde_json::json;

use crate::common::{test_email, test_password, TestContext};

async fn change_role(
    ctx: &TestContext,
    token: &str,
    target_id: &str,
    role: &str,
) -> axum_test::TestResponse {
    ctx.server
        .put(&format!("/auth/users/{}/role", target_id))
        .authorization_bearer(token)
        .json(&json!({ "role": role }))
        .await
}

#[tokio::test]
async fn admin_cannot_promote_to_admin_tier() {
    let ctx = TestContext::new().await;
    let (_, token) = ctx.admin_token().await;
    let target = ctx.insert_user(&test_email(), None, "editor").await;

    change_role(&ctx, &token, &target, "admin")
        .await
        .assert_status(StatusCode::FORBIDDEN);
    change_role(&ctx, &token, &target, "superadmin")
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn superadmin_can_set_any_role() {
    let ctx = TestContext::new().await;
    let (_, token) = ctx.superadmin_token().await;
    let target = ctx.insert_user(&test_email(), None, "player").await;

    for role in ["editor", "viewer", "admin", "superadmin", "player"] {
        let response = change_role(&ctx, &token, &target, role).await;
        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        assert_eq!(body["role"], role);
    }
}

#[tokio::test]
async fn self_targeted_role_change_always_fails() {
    let ctx = TestContext::new().await;

    let (admin_id, admin) = ctx.admin_token().await;
    change_role(&ctx, &admin, &admin_id, "player")
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let (super_id, superadmin) = ctx.superadmin_token().await;
    change_role(&ctx, &superadmin, &super_id, "player")
        .await
        .assert_status(StatusCode::FORBIDDEN);

    // Self-revocation is equally off limits
    ctx.server
        .put(&format!("/auth/revoke-role/{}", super_id))
        .authorization_bearer(&superadmin)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_cannot_touch_an_admin_tier_target() {
    let ctx = TestContext::new().await;
    let (_, token) = ctx.admin_token().await;
    let other_admin = ctx.insert_user(&test_email(), None, "admin").await;

    change_role(&ctx, &token, &other_admin, "player")
        .await
        .assert_status(StatusCode::FORBIDDEN);

    ctx.server
        .put(&format!("/auth/revoke-role/{}", other_admin))
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn revoke_downgrades_to_player_without_deleting() {
    let ctx = TestContext::new().await;
    let (_, token) = ctx.admin_token().await;
    let email = test_email();
    let target = ctx.insert_user(&email, None, "editor").await;

    let response = ctx
        .server
        .put(&format!("/auth/revoke-role/{}", target))
        .authorization_bearer(&token)
        .await;

    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["role"], "player");

    let (is_deleted,): (bool,) = sqlx::query_as("SELECT is_deleted FROM users WHERE id = ?")
        .bind(&target)
        .fetch_one(&ctx.db)
        .await
        .unwrap();
    assert!(!is_deleted, "revocation must never delete the account");

    let mail = ctx.mailbox.last_to(&email).expect("no revocation notice");
    assert!(mail.subject.to_lowercase().contains("revoked"));
}

#[tokio::test]
async fn role_change_sends_a_notification_email() {
    let ctx = TestContext::new().await;
    let (_, token) = ctx.admin_token().await;
    let email = test_email();
    let target = ctx.insert_user(&email, None, "player").await;

    change_role(&ctx, &token, &target, "editor")
        .await
        .assert_status(StatusCode::OK);

    let mail = ctx.mailbox.last_to(&email).expect("no role change notice");
    assert!(mail.body.contains("editor"));
}

#[tokio::test]
async fn editor_cannot_change_roles() {
    let ctx = TestContext::new().await;
    let email = test_email();
    ctx.insert_user(&email, None, "editor").await;
    let (_, token) = ctx.login_token(&email, test_password()).await;
    let target = ctx.insert_user(&test_email(), None, "player").await;

    change_role(&ctx, &token, &target, "viewer")
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn changing_the_role_of_an_unknown_user_returns_not_found() {
    let ctx = TestContext::new().await;
    let (_, token) = ctx.admin_token().await;

    change_role(&ctx, &token, &uuid::Uuid::new_v4().to_string(), "viewer")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn role_endpoints_require_authentication() {
    let ctx = TestContext::new().await;
    let target = ctx.insert_user(&test_email(), None, "player").await;

    ctx.server
        .put(&format!("/auth/users/{}/role", target))
        .json(&json!({ "role": "editor" }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}
