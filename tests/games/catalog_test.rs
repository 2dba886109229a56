use axum::http::StatusCode;

use crate::common::TestContext;

#[tokio::test]
async fn catalog_lists_active_games_alphabetically() {
    let ctx = TestContext::new().await;
    ctx.insert_game("Zebra Dash", "arcade").await;
    ctx.insert_game("Asteroid Run", "arcade").await;
    let hidden = ctx.insert_game("Hidden Gem", "puzzle").await;
    sqlx::query("UPDATE games SET is_active = 0 WHERE id = ?")
        .bind(&hidden)
        .execute(&ctx.db)
        .await
        .unwrap();

    let response = ctx.server.get("/games").await;

    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["total"], 2);
    assert_eq!(body["games"][0]["title"], "Asteroid Run");
    assert_eq!(body["games"][1]["title"], "Zebra Dash");
}

#[tokio::test]
async fn catalog_filters_by_genre_and_search() {
    let ctx = TestContext::new().await;
    ctx.insert_game("Chess Arena", "strategy").await;
    ctx.insert_game("Checkers Arena", "strategy").await;
    ctx.insert_game("Pinball Plus", "arcade").await;

    let strategy: serde_json::Value = ctx
        .server
        .get("/games")
        .add_query_param("genre", "strategy")
        .await
        .json();
    assert_eq!(strategy["total"], 2);

    let chess: serde_json::Value = ctx
        .server
        .get("/games")
        .add_query_param("search", "Chess")
        .await
        .json();
    assert_eq!(chess["total"], 1);
    assert_eq!(chess["games"][0]["title"], "Chess Arena");
}

#[tokio::test]
async fn catalog_paginates_only_when_page_and_limit_are_given() {
    let ctx = TestContext::new().await;
    for i in 0..5 {
        ctx.insert_game(&format!("Game {}", i), "arcade").await;
    }

    let full: serde_json::Value = ctx.server.get("/games").await.json();
    assert_eq!(full["total"], 5);

    let page: serde_json::Value = ctx
        .server
        .get("/games")
        .add_query_param("page", "1")
        .add_query_param("limit", "2")
        .await
        .json();
    assert_eq!(page["total"], 2);

    // A lone limit is ignored
    let limit_only: serde_json::Value = ctx
        .server
        .get("/games")
        .add_query_param("limit", "2")
        .await
        .json();
    assert_eq!(limit_only["total"], 5);
}

#[tokio::test]
async fn unknown_game_returns_not_found() {
    let ctx = TestContext::new().await;

    ctx.server
        .get(&format!("/games/{}", uuid::Uuid::new_v4()))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn game_detail_returns_the_full_record() {
    let ctx = TestContext::new().await;
    let id = ctx.insert_game("Solo Quest", "adventure").await;

    let response = ctx.server.get(&format!("/games/{}", id)).await;

    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["id"], id);
    assert_eq!(body["slug"], "solo-quest");
    assert_eq!(body["genre"], "adventure");
}
