use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::model::Game;

/// Catalog filters. `page`/`limit` must both be present to paginate;
/// otherwise the full filtered set is returned.
#[derive(Debug, Default, Deserialize)]
pub struct GamesQuery {
    pub genre: Option<String>,
    pub search: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct GameResponse {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub genre: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Game> for GameResponse {
    fn from(game: &Game) -> Self {
        Self {
            id: game.id.clone(),
            title: game.title.clone(),
            slug: game.slug.clone(),
            genre: game.genre.clone(),
            description: game.description.clone(),
            is_active: game.is_active,
            created_at: game.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GamesListResponse {
    pub games: Vec<GameResponse>,
    pub total: i64,
}
