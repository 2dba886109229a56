use chrono::{DateTime, Utc};

use crate::config::DbPool;
use super::model::{Invitation, RoleName, User};

const SELECT_USER: &str =
    "SELECT u.*, r.name AS role_name FROM users u JOIN roles r ON r.id = u.role_id";

const SELECT_INVITATION: &str =
    "SELECT i.*, r.name AS role_name FROM invitations i JOIN roles r ON r.id = i.role_id";

/// Insert payload for a fresh account. The role is stored by name lookup
/// so the seeded `roles` table stays the only source of role ids.
pub struct NewUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub password_hash: String,
    pub role: RoleName,
    pub is_adult: bool,
    pub is_verified: bool,
}

pub struct UserCrud {
    pool: DbPool,
}

impl UserCrud {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user: &NewUser) -> Result<(), sqlx::Error> {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, phone_number, password_hash, role_id,
                               is_active, is_verified, is_adult, is_deleted, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, (SELECT id FROM roles WHERE name = ?), 1, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone_number)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.is_verified)
        .bind(user.is_adult)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("{} WHERE u.id = ?", SELECT_USER))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_active_by_id(&self, id: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "{} WHERE u.id = ? AND u.is_deleted = 0",
            SELECT_USER
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Includes soft-deleted rows; used for duplicate checks and the
    /// invitation restoration path.
    pub async fn find_by_email_any(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("{} WHERE u.email = ?", SELECT_USER))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_active_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "{} WHERE u.email = ? AND u.is_deleted = 0",
            SELECT_USER
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn find_active_by_phone(&self, phone: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "{} WHERE u.phone_number = ? AND u.is_deleted = 0",
            SELECT_USER
        ))
        .bind(phone)
        .fetch_optional(&self.pool)
        .await
    }

    /// Duplicate check across every row, soft-deleted included, so a new
    /// registration can never collide with the unique constraints.
    pub async fn identifier_taken(
        &self,
        email: &str,
        phone: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM users WHERE email = ? OR (phone_number IS NOT NULL AND phone_number = ?)",
        )
        .bind(email)
        .bind(phone)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0 > 0)
    }

    pub async fn phone_taken_by_active(&self, phone: &str) -> Result<bool, sqlx::Error> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM users WHERE phone_number = ? AND is_deleted = 0",
        )
        .bind(phone)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0 > 0)
    }

    /// A successful login also reactivates an auto-deactivated account.
    pub async fn record_login(&self, id: &str, now: DateTime<Utc>) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET last_logged_in = ?, last_seen = ?, is_active = 1, updated_at = ? WHERE id = ?",
        )
        .bind(now)
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn touch_last_seen(&self, id: &str, now: DateTime<Utc>) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_seen = ? WHERE id = ?")
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn set_verified(&self, id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET is_verified = 1, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn set_role(&self, id: &str, role: RoleName) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET role_id = (SELECT id FROM roles WHERE name = ?), updated_at = ? WHERE id = ?",
        )
        .bind(role.as_str())
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn set_password(&self, id: &str, password_hash: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(password_hash)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn set_reset_token(
        &self,
        id: &str,
        token_hash: &str,
        expiry: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET reset_token = ?, reset_token_expiry = ?, updated_at = ? WHERE id = ?",
        )
        .bind(token_hash)
        .bind(expiry)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn find_by_valid_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "{} WHERE u.reset_token = ? AND u.reset_token_expiry > ? AND u.is_deleted = 0",
            SELECT_USER
        ))
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
    }

    /// Empty token + epoch expiry marks a consumed reset, as opposed to
    /// NULL which means "never requested".
    pub async fn mark_reset_token_used(&self, id: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET reset_token = '', reset_token_expiry = ?, updated_at = ? WHERE id = ?",
        )
        .bind(DateTime::<Utc>::UNIX_EPOCH)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Brings a soft-deleted account back on the same primary key with
    /// the invitation's role and fresh credentials.
    pub async fn restore_invited(
        &self,
        id: &str,
        name: &str,
        phone_number: Option<&str>,
        password_hash: &str,
        role: RoleName,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET name = ?, phone_number = ?, password_hash = ?,
                role_id = (SELECT id FROM roles WHERE name = ?),
                is_active = 1, is_verified = 1, is_deleted = 0, deleted_at = NULL,
                reset_token = NULL, reset_token_expiry = NULL, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(name)
        .bind(phone_number)
        .bind(password_hash)
        .bind(role.as_str())
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn soft_delete(&self, id: &str, now: DateTime<Utc>) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET is_deleted = 1, deleted_at = ?, is_active = 0, updated_at = ? WHERE id = ?",
        )
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

pub struct InvitationCrud {
    pool: DbPool,
}

impl InvitationCrud {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_pending_by_email(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Invitation>, sqlx::Error> {
        sqlx::query_as::<_, Invitation>(&format!(
            "{} WHERE i.email = ? AND i.is_accepted = 0 AND i.expires_at > ?",
            SELECT_INVITATION
        ))
        .bind(email)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn find_by_token(&self, token: &str) -> Result<Option<Invitation>, sqlx::Error> {
        sqlx::query_as::<_, Invitation>(&format!("{} WHERE i.token = ?", SELECT_INVITATION))
            .bind(token)
            .fetch_optional(&self.pool)
            .await
    }

    /// Drops stale (accepted or expired) rows for the email and inserts
    /// the replacement in one transaction, so a crash can never leave the
    /// email without its single active invitation.
    pub async fn replace_for_email(
        &self,
        email: &str,
        role: RoleName,
        token: &str,
        expires_at: DateTime<Utc>,
        invited_by: &str,
    ) -> Result<Invitation, sqlx::Error> {
        let now = Utc::now();
        let id = uuid::Uuid::new_v4().to_string();

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM invitations WHERE email = ? AND (is_accepted = 1 OR expires_at <= ?)")
            .bind(email)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO invitations (id, email, role_id, token, is_accepted, expires_at, invited_by, created_at)
            VALUES (?, ?, (SELECT id FROM roles WHERE name = ?), ?, 0, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(email)
        .bind(role.as_str())
        .bind(token)
        .bind(expires_at)
        .bind(invited_by)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let invitation = sqlx::query_as::<_, Invitation>(&format!(
            "{} WHERE i.id = ?",
            SELECT_INVITATION
        ))
        .bind(&id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(invitation)
    }

    pub async fn mark_accepted(&self, id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE invitations SET is_accepted = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM invitations WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
