use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::fmt;

/// Portal role ladder: superadmin > admin > editor/viewer > player.
/// Reference data; the `roles` table is seeded once and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleName {
    Superadmin,
    Admin,
    Editor,
    Viewer,
    Player,
}

impl RoleName {
    pub fn as_str(self) -> &'static str {
        match self {
            RoleName::Superadmin => "superadmin",
            RoleName::Admin => "admin",
            RoleName::Editor => "editor",
            RoleName::Viewer => "viewer",
            RoleName::Player => "player",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "superadmin" => Some(RoleName::Superadmin),
            "admin" => Some(RoleName::Admin),
            "editor" => Some(RoleName::Editor),
            "viewer" => Some(RoleName::Viewer),
            "player" => Some(RoleName::Player),
            _ => None,
        }
    }

    /// Admin-tier roles may invite, revoke and reassign.
    pub fn is_admin(self) -> bool {
        matches!(self, RoleName::Superadmin | RoleName::Admin)
    }

    /// Whether this actor may grant, revoke or invite `target`.
    /// Admins stop below the admin tier; superadmins manage everything.
    pub fn can_manage(self, target: RoleName) -> bool {
        match self {
            RoleName::Superadmin => true,
            RoleName::Admin => {
                matches!(target, RoleName::Editor | RoleName::Viewer | RoleName::Player)
            }
            _ => false,
        }
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every query selects `r.name AS role_name` alongside `users.*`;
/// `role_id` and `role_name` therefore never drift apart.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub password_hash: String,
    pub role_id: i64,
    pub role_name: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub is_adult: bool,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub last_logged_in: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
    pub reset_token: Option<String>,
    pub reset_token_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn role(&self) -> RoleName {
        RoleName::parse(&self.role_name).unwrap_or(RoleName::Player)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Invitation {
    pub id: String,
    pub email: String,
    pub role_id: i64,
    pub role_name: String,
    pub token: String,
    pub is_accepted: bool,
    pub expires_at: DateTime<Utc>,
    pub invited_by: String,
    pub created_at: DateTime<Utc>,
}

impl Invitation {
    pub fn role(&self) -> RoleName {
        RoleName::parse(&self.role_name).unwrap_or(RoleName::Player)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
