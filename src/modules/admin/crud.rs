use chrono::{DateTime, Utc};
use sqlx::QueryBuilder;

use crate::config::DbPool;
use crate::modules::auth::model::User;

use super::schema::{ActivityEntry, GamePopularityEntry, UsersQuery};

/// Read-only aggregation queries behind the admin dashboards. Each method
/// is an independent composition over the same tables; nothing here
/// mutates state.
pub struct AdminCrud {
    pool: DbPool,
}

/// (sessions, total play seconds, unique players)
pub struct SessionStats {
    pub sessions: i64,
    pub total_play_seconds: i64,
    pub unique_players: i64,
}

impl AdminCrud {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn count_users(&self) -> Result<i64, sqlx::Error> {
        self.scalar("SELECT COUNT(*) FROM users WHERE is_deleted = 0").await
    }

    pub async fn count_active_users(&self) -> Result<i64, sqlx::Error> {
        self.scalar("SELECT COUNT(*) FROM users WHERE is_deleted = 0 AND is_active = 1")
            .await
    }

    pub async fn count_games(&self) -> Result<i64, sqlx::Error> {
        self.scalar("SELECT COUNT(*) FROM games").await
    }

    pub async fn count_sessions(&self) -> Result<i64, sqlx::Error> {
        self.scalar("SELECT COUNT(*) FROM game_sessions").await
    }

    pub async fn count_signups_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM users WHERE is_deleted = 0 AND created_at >= ? AND created_at < ?",
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn count_sessions_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM game_sessions WHERE started_at >= ? AND started_at < ?",
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn count_game_sessions_between(
        &self,
        game_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM game_sessions WHERE game_id = ? AND started_at >= ? AND started_at < ?",
        )
        .bind(game_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Most-played games first; games with no sessions still appear.
    pub async fn games_popularity(&self) -> Result<Vec<GamePopularityEntry>, sqlx::Error> {
        sqlx::query_as::<_, GamePopularityEntry>(
            r#"
            SELECT g.id AS game_id, g.title AS title,
                   COUNT(s.id) AS sessions,
                   COALESCE(SUM(s.duration_seconds), 0) AS total_play_seconds
            FROM games g
            LEFT JOIN game_sessions s ON s.game_id = g.id
            GROUP BY g.id, g.title
            ORDER BY sessions DESC, total_play_seconds DESC, g.title
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn game_session_stats(&self, game_id: &str) -> Result<SessionStats, sqlx::Error> {
        let (sessions, total_play_seconds, unique_players): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(duration_seconds), 0),
                   COUNT(DISTINCT user_id)
            FROM game_sessions
            WHERE game_id = ?
            "#,
        )
        .bind(game_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(SessionStats {
            sessions,
            total_play_seconds,
            unique_players,
        })
    }

    pub async fn user_session_stats(&self, user_id: &str) -> Result<(i64, i64), sqlx::Error> {
        sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(duration_seconds), 0) FROM game_sessions WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn most_played_game(&self, user_id: &str) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT g.title
            FROM game_sessions s
            JOIN games g ON g.id = s.game_id
            WHERE s.user_id = ?
            GROUP BY g.id, g.title
            ORDER BY COUNT(*) DESC, g.title
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(title,)| title))
    }

    /// Session log joined with user and game names, newest first.
    pub async fn activity_log(
        &self,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Vec<ActivityEntry>, sqlx::Error> {
        let mut qb = QueryBuilder::new(
            r#"
            SELECT s.id AS session_id, s.user_id AS user_id, u.name AS user_name,
                   s.game_id AS game_id, g.title AS game_title,
                   s.activity_type AS activity_type, s.started_at AS started_at,
                   s.ended_at AS ended_at, s.duration_seconds AS duration_seconds
            FROM game_sessions s
            JOIN users u ON u.id = s.user_id
            JOIN games g ON g.id = s.game_id
            ORDER BY s.started_at DESC
            "#,
        );

        if let (Some(page), Some(limit)) = (page, limit) {
            let offset = (page.max(1) - 1) * limit;
            qb.push(" LIMIT ").push_bind(limit);
            qb.push(" OFFSET ").push_bind(offset);
        }

        qb.build_query_as::<ActivityEntry>().fetch_all(&self.pool).await
    }

    /// Filtered user listing. Soft-deleted accounts never show up;
    /// pagination only applies when both page and limit are supplied.
    pub async fn list_users(&self, query: &UsersQuery) -> Result<Vec<User>, sqlx::Error> {
        let mut qb = QueryBuilder::new(
            "SELECT u.*, r.name AS role_name FROM users u JOIN roles r ON r.id = u.role_id WHERE u.is_deleted = 0",
        );

        if let Some(role) = &query.role {
            qb.push(" AND r.name = ").push_bind(role);
        }
        if let Some(is_active) = query.is_active {
            qb.push(" AND u.is_active = ").push_bind(is_active);
        }
        if let Some(search) = &query.search {
            let pattern = format!("%{}%", search);
            qb.push(" AND (u.name LIKE ")
                .push_bind(pattern.clone())
                .push(" OR u.email LIKE ")
                .push_bind(pattern)
                .push(")");
        }

        qb.push(" ORDER BY u.created_at DESC");

        if let (Some(page), Some(limit)) = (query.page, query.limit) {
            let offset = (page.max(1) - 1) * limit;
            qb.push(" LIMIT ").push_bind(limit);
            qb.push(" OFFSET ").push_bind(offset);
        }

        qb.build_query_as::<User>().fetch_all(&self.pool).await
    }

    async fn scalar(&self, sql: &str) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(sql).fetch_one(&self.pool).await?;
        Ok(count)
    }
}
