use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct Game {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub genre: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
