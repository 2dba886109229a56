use sqlx::QueryBuilder;

use crate::config::DbPool;

use super::model::Game;
use super::schema::GamesQuery;

pub struct GameCrud {
    pool: DbPool,
}

impl GameCrud {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Game>, sqlx::Error> {
        sqlx::query_as::<_, Game>("SELECT * FROM games WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn list(&self, query: &GamesQuery) -> Result<Vec<Game>, sqlx::Error> {
        let mut qb = QueryBuilder::new("SELECT * FROM games WHERE 1 = 1");

        if !query.include_inactive {
            qb.push(" AND is_active = 1");
        }
        if let Some(genre) = &query.genre {
            qb.push(" AND genre = ").push_bind(genre);
        }
        if let Some(search) = &query.search {
            qb.push(" AND title LIKE ").push_bind(format!("%{}%", search));
        }

        qb.push(" ORDER BY title");

        // Pagination only when the caller asks for it explicitly
        if let (Some(page), Some(limit)) = (query.page, query.limit) {
            let offset = (page.max(1) - 1) * limit;
            qb.push(" LIMIT ").push_bind(limit);
            qb.push(" OFFSET ").push_bind(offset);
        }

        qb.build_query_as::<Game>().fetch_all(&self.pool).await
    }
}
