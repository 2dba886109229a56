use chrono::{DateTime, Utc};
use sqlx::QueryBuilder;

use crate::config::DbPool;

use super::model::{GameSession, SignupClick};
use super::schema::CountEntry;

pub struct SessionCrud {
    pool: DbPool,
}

impl SessionCrud {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn insert_started(&self, session: &GameSession) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO game_sessions (id, user_id, game_id, activity_type, started_at, ended_at, duration_seconds)
            VALUES (?, ?, ?, ?, ?, NULL, NULL)
            "#,
        )
        .bind(&session.id)
        .bind(&session.user_id)
        .bind(&session.game_id)
        .bind(&session.activity_type)
        .bind(session.started_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<GameSession>, sqlx::Error> {
        sqlx::query_as::<_, GameSession>("SELECT * FROM game_sessions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Closes the session and derives its duration in whole seconds.
    pub async fn close(&self, id: &str, ended_at: DateTime<Utc>) -> Result<bool, sqlx::Error> {
        let Some(session) = self.find_by_id(id).await? else {
            return Ok(false);
        };

        let duration = (ended_at - session.started_at).num_seconds().max(0);

        sqlx::query("UPDATE game_sessions SET ended_at = ?, duration_seconds = ? WHERE id = ?")
            .bind(ended_at)
            .bind(duration)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(true)
    }
}

pub struct SignupClickCrud {
    pool: DbPool,
}

impl SignupClickCrud {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, click: &SignupClick) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO signup_clicks (id, session_id, ip_address, country, device_type, source, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&click.id)
        .bind(&click.session_id)
        .bind(&click.ip_address)
        .bind(&click.country)
        .bind(&click.device_type)
        .bind(&click.source)
        .bind(click.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn total(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<i64, sqlx::Error> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM signup_clicks WHERE 1 = 1");
        push_range(&mut qb, from, to);

        let (count,): (i64,) = qb.build_query_as().fetch_one(&self.pool).await?;
        Ok(count)
    }

    pub async fn count_grouped(
        &self,
        column: GroupColumn,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<CountEntry>, sqlx::Error> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT {col} AS key, COUNT(*) AS count FROM signup_clicks WHERE 1 = 1",
            col = column.as_str()
        ));
        push_range(&mut qb, from, to);
        qb.push(format!(
            " GROUP BY {col} ORDER BY count DESC, key",
            col = column.as_str()
        ));

        let rows: Vec<(String, i64)> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|(key, count)| CountEntry { key, count })
            .collect())
    }
}

/// Groupable dimensions; a closed set so no caller-supplied identifier
/// ever reaches the SQL text.
#[derive(Clone, Copy)]
pub enum GroupColumn {
    Country,
    DeviceType,
    Source,
}

impl GroupColumn {
    fn as_str(self) -> &'static str {
        match self {
            GroupColumn::Country => "country",
            GroupColumn::DeviceType => "device_type",
            GroupColumn::Source => "source",
        }
    }
}

fn push_range(
    qb: &mut QueryBuilder<'_, sqlx::Sqlite>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) {
    if let Some(from) = from {
        qb.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = to {
        qb.push(" AND created_at < ").push_bind(to);
    }
}
