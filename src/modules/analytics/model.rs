use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// One play session. `duration_seconds` is derived when the session is
/// closed, never supplied by the client.
#[derive(Debug, Clone, FromRow)]
pub struct GameSession {
    pub id: String,
    pub user_id: String,
    pub game_id: String,
    pub activity_type: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i64>,
}

/// Anonymous signup funnel click.
#[derive(Debug, Clone, FromRow)]
pub struct SignupClick {
    pub id: String,
    pub session_id: String,
    pub ip_address: String,
    pub country: String,
    pub device_type: String,
    pub source: String,
    pub created_at: DateTime<Utc>,
}
