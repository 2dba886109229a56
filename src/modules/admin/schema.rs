use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn default_period() -> String {
    "last24hours".to_string()
}

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    #[serde(default = "default_period")]
    pub period: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct TrendCount {
    pub current: i64,
    pub previous: i64,
    pub change_pct: f64,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub total_users: i64,
    pub active_users: i64,
    pub total_games: i64,
    pub total_sessions: i64,
    pub new_signups: TrendCount,
    pub sessions: TrendCount,
    pub current_period_start: DateTime<Utc>,
    pub previous_period_start: DateTime<Utc>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct GamePopularityEntry {
    pub game_id: String,
    pub title: String,
    pub sessions: i64,
    pub total_play_seconds: i64,
}

#[derive(Debug, Serialize)]
pub struct GameAnalyticsResponse {
    pub game_id: String,
    pub title: String,
    pub sessions: TrendCount,
    pub total_play_seconds: i64,
    pub average_session_seconds: f64,
    pub unique_players: i64,
}

#[derive(Debug, Serialize)]
pub struct UserAnalyticsResponse {
    pub user_id: String,
    pub name: String,
    pub sessions: i64,
    pub total_play_seconds: i64,
    pub most_played_game: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ActivityEntry {
    pub session_id: String,
    pub user_id: String,
    pub user_name: String,
    pub game_id: String,
    pub game_title: String,
    pub activity_type: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct UsersListResponse {
    pub users: Vec<crate::modules::auth::schema::UserResponse>,
    pub total: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct UsersQuery {
    pub role: Option<String>,
    pub is_active: Option<bool>,
    /// Substring match on name or email
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
