use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::modules::auth::schema::{ErrorResponse, UserResponse};
use crate::modules::games::crud::GameCrud;
use crate::modules::games::schema::{GameResponse, GamesListResponse, GamesQuery};
use crate::AppState;

use super::crud::AdminCrud;
use super::period::{pct_change, resolve_windows};
use super::schema::{
    ActivityEntry, ActivityQuery, DashboardQuery, DashboardResponse, GameAnalyticsResponse,
    GamePopularityEntry, TrendCount, UserAnalyticsResponse, UsersListResponse, UsersQuery,
};

type ApiError = (StatusCode, Json<ErrorResponse>);

fn db_error(e: sqlx::Error) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(e.to_string())),
    )
}

fn not_found(message: &str) -> ApiError {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::new(message)))
}

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let windows = resolve_windows(&query.period, query.start, query.end, Utc::now())
        .map_err(|e| (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(e.to_string()))))?;

    let admin = AdminCrud::new(state.db.clone());

    let signups_current = admin
        .count_signups_between(windows.current_start, windows.current_end)
        .await
        .map_err(db_error)?;
    let signups_previous = admin
        .count_signups_between(windows.previous_start, windows.previous_end)
        .await
        .map_err(db_error)?;

    let sessions_current = admin
        .count_sessions_between(windows.current_start, windows.current_end)
        .await
        .map_err(db_error)?;
    let sessions_previous = admin
        .count_sessions_between(windows.previous_start, windows.previous_end)
        .await
        .map_err(db_error)?;

    Ok(Json(DashboardResponse {
        total_users: admin.count_users().await.map_err(db_error)?,
        active_users: admin.count_active_users().await.map_err(db_error)?,
        total_games: admin.count_games().await.map_err(db_error)?,
        total_sessions: admin.count_sessions().await.map_err(db_error)?,
        new_signups: TrendCount {
            current: signups_current,
            previous: signups_previous,
            change_pct: pct_change(signups_current, signups_previous),
        },
        sessions: TrendCount {
            current: sessions_current,
            previous: sessions_previous,
            change_pct: pct_change(sessions_current, sessions_previous),
        },
        current_period_start: windows.current_start,
        previous_period_start: windows.previous_start,
    }))
}

pub async fn games_popularity(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<GamePopularityEntry>>, ApiError> {
    let entries = AdminCrud::new(state.db.clone())
        .games_popularity()
        .await
        .map_err(db_error)?;

    Ok(Json(entries))
}

pub async fn game_analytics(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<GameAnalyticsResponse>, ApiError> {
    let game = GameCrud::new(state.db.clone())
        .find_by_id(&id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| not_found("Game not found"))?;

    let windows = resolve_windows(&query.period, query.start, query.end, Utc::now())
        .map_err(|e| (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(e.to_string()))))?;

    let admin = AdminCrud::new(state.db.clone());
    let stats = admin.game_session_stats(&id).await.map_err(db_error)?;

    let current = admin
        .count_game_sessions_between(&id, windows.current_start, windows.current_end)
        .await
        .map_err(db_error)?;
    let previous = admin
        .count_game_sessions_between(&id, windows.previous_start, windows.previous_end)
        .await
        .map_err(db_error)?;

    let average_session_seconds = if stats.sessions > 0 {
        stats.total_play_seconds as f64 / stats.sessions as f64
    } else {
        0.0
    };

    Ok(Json(GameAnalyticsResponse {
        game_id: game.id,
        title: game.title,
        sessions: TrendCount {
            current,
            previous,
            change_pct: pct_change(current, previous),
        },
        total_play_seconds: stats.total_play_seconds,
        average_session_seconds,
        unique_players: stats.unique_players,
    }))
}

pub async fn user_analytics(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<UserAnalyticsResponse>, ApiError> {
    let user = state
        .auth_service
        .get_user(&id)
        .await
        .map_err(|e| (e.status_code(), Json(ErrorResponse::new(e.to_string()))))?;

    let admin = AdminCrud::new(state.db.clone());
    let (sessions, total_play_seconds) =
        admin.user_session_stats(&id).await.map_err(db_error)?;
    let most_played_game = admin.most_played_game(&id).await.map_err(db_error)?;

    Ok(Json(UserAnalyticsResponse {
        user_id: user.id,
        name: user.name,
        sessions,
        total_play_seconds,
        most_played_game,
    }))
}

pub async fn user_activity(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<Vec<ActivityEntry>>, ApiError> {
    let entries = AdminCrud::new(state.db.clone())
        .activity_log(query.page, query.limit)
        .await
        .map_err(db_error)?;

    Ok(Json(entries))
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UsersQuery>,
) -> Result<Json<UsersListResponse>, ApiError> {
    let users = AdminCrud::new(state.db.clone())
        .list_users(&query)
        .await
        .map_err(db_error)?;

    let total = users.len() as i64;
    Ok(Json(UsersListResponse {
        users: users.iter().map(UserResponse::from).collect(),
        total,
    }))
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
