use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::config::DbPool;
use crate::modules::auth::model::User;

use super::model::{Otp, OtpChannel};

pub struct OtpCrud {
    pool: DbPool,
}

impl OtpCrud {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        user: &User,
        channel: OtpChannel,
        secret: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Otp, sqlx::Error> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO otps (id, user_id, email, phone_number, channel, secret, expires_at, is_verified, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(&id)
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.phone_number)
        .bind(channel.as_str())
        .bind(secret)
        .bind(expires_at)
        .bind(now)
        .execute(&self.pool)
        .await?;

        sqlx::query_as::<_, Otp>("SELECT * FROM otps WHERE id = ?")
            .bind(&id)
            .fetch_one(&self.pool)
            .await
    }

    /// Newer requests supersede older ones; verification only ever looks
    /// at the most recent unverified row.
    pub async fn latest_unverified_for_user(
        &self,
        user_id: &str,
    ) -> Result<Option<Otp>, sqlx::Error> {
        sqlx::query_as::<_, Otp>(
            "SELECT * FROM otps WHERE user_id = ? AND is_verified = 0 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn set_secret(&self, id: &str, secret: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE otps SET secret = ? WHERE id = ?")
            .bind(secret)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Verified rows are flagged, never deleted.
    pub async fn mark_verified(&self, id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE otps SET is_verified = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
