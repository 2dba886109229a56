use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::modules::auth::schema::ErrorResponse;
use crate::AppState;

use super::crud::GameCrud;
use super::schema::{GameResponse, GamesListResponse, GamesQuery};

type ApiError = (StatusCode, Json<ErrorResponse>);

fn db_error(e: sqlx::Error) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(e.to_string())),
    )
}

pub async fn list_games(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GamesQuery>,
) -> Result<Json<GamesListResponse>, ApiError> {
    let games = GameCrud::new(state.db.clone())
        .list(&query)
        .await
        .map_err(db_error)?;

    let total = games.len() as i64;
    Ok(Json(GamesListResponse {
        games: games.iter().map(GameResponse::from).collect(),
        total,
    }))
}

pub async fn get_game(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<GameResponse>, ApiError> {
    let game = GameCrud::new(state.db.clone())
        .find_by_id(&id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new("Game not found")),
            )
        })?;

    Ok(Json(GameResponse::from(&game)))
}
