use axum::http::StatusCode;
use chrono::{Duration, Utc};
use rand::Rng;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::{Config, DbPool};
use crate::middleware::auth::CurrentUser;
use crate::services::email::{EmailMessage, EmailSender};
use crate::services::hashing;

use super::crud::{InvitationCrud, NewUser, UserCrud};
use super::model::{Invitation, RoleName, User};

const RESET_TOKEN_TTL_MINUTES: i64 = 60;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Email or phone number already registered")]
    AlreadyRegistered,

    #[error("Phone number already in use")]
    PhoneTaken,

    #[error("An active user with this email already holds that role")]
    AlreadyHasRole,

    #[error("Email already belongs to an active account")]
    EmailInUse,

    #[error("A pending invitation already exists for this email")]
    PendingInvitation,

    #[error("Not allowed to manage this role")]
    Forbidden,

    #[error("Own role cannot be changed")]
    SelfRoleChange,

    #[error("Invalid or already accepted invitation")]
    InvalidInvitation,

    #[error("Invitation has expired")]
    InvitationExpired,

    #[error("Invalid or expired reset token")]
    InvalidResetToken,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Hashing error: {0}")]
    Hashing(#[from] bcrypt::BcryptError),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::AlreadyRegistered | Self::PhoneTaken => StatusCode::CONFLICT,
            Self::AlreadyHasRole
            | Self::EmailInUse
            | Self::PendingInvitation
            | Self::InvalidInvitation
            | Self::InvitationExpired
            | Self::InvalidResetToken => StatusCode::BAD_REQUEST,
            Self::Forbidden | Self::SelfRoleChange => StatusCode::FORBIDDEN,
            Self::Database(_) | Self::Hashing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub struct RegisterPlayerInput {
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub password: String,
    pub is_adult: bool,
}

pub struct AcceptInvitationInput {
    pub name: String,
    pub phone_number: Option<String>,
    pub password: String,
}

pub struct InvitationPreview {
    pub email: String,
    pub role: RoleName,
    pub user_exists: bool,
}

/// Registration, login, invitations, role management and password reset.
/// Constructed once at startup and shared through `AppState`.
pub struct AuthService {
    users: UserCrud,
    invitations: InvitationCrud,
    config: Arc<Config>,
    mailer: Arc<dyn EmailSender>,
}

impl AuthService {
    pub fn new(pool: DbPool, config: Arc<Config>, mailer: Arc<dyn EmailSender>) -> Self {
        Self {
            users: UserCrud::new(pool.clone()),
            invitations: InvitationCrud::new(pool),
            config,
            mailer,
        }
    }

    // =========================================================================
    // Registration & login
    // =========================================================================

    /// Self-service signup always lands on the `player` role. The
    /// duplicate check includes soft-deleted rows: restoration is the
    /// invitation path's job, not registration's.
    pub async fn register_player(&self, input: RegisterPlayerInput) -> Result<User, AuthError> {
        if self
            .users
            .identifier_taken(&input.email, input.phone_number.as_deref())
            .await?
        {
            return Err(AuthError::AlreadyRegistered);
        }

        let new_user = NewUser {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            email: input.email,
            phone_number: input.phone_number,
            password_hash: hashing::hash_password(&input.password)?,
            role: RoleName::Player,
            is_adult: input.is_adult,
            is_verified: false,
        };

        self.users.create(&new_user).await?;

        self.users
            .find_active_by_id(&new_user.id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Credential check only; the controller owns the OTP step. Unknown
    /// identifier and wrong password are indistinguishable on purpose.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<User, AuthError> {
        let user = if identifier.contains('@') {
            self.users.find_active_by_email(identifier).await?
        } else {
            self.users.find_active_by_phone(identifier).await?
        }
        .ok_or(AuthError::InvalidCredentials)?;

        if !hashing::verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let now = Utc::now();
        self.users.record_login(&user.id, now).await?;

        let mut user = user;
        user.is_active = true;
        user.last_logged_in = Some(now);
        user.last_seen = Some(now);
        Ok(user)
    }

    pub async fn get_user(&self, id: &str) -> Result<User, AuthError> {
        self.users
            .find_active_by_id(id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    // =========================================================================
    // Invitations
    // =========================================================================

    pub async fn create_invitation(
        &self,
        actor: &CurrentUser,
        email: &str,
        role: RoleName,
    ) -> Result<Invitation, AuthError> {
        if !actor.role.can_manage(role) {
            return Err(AuthError::Forbidden);
        }

        if let Some(existing) = self.users.find_by_email_any(email).await? {
            if !existing.is_deleted {
                if existing.role() == role {
                    return Err(AuthError::AlreadyHasRole);
                }
                return Err(AuthError::EmailInUse);
            }
            // Soft-deleted accounts stay invitable so they can be restored.
        }

        let now = Utc::now();
        if self
            .invitations
            .find_pending_by_email(email, now)
            .await?
            .is_some()
        {
            return Err(AuthError::PendingInvitation);
        }

        let token = random_token();
        let expires_at = now + Duration::days(self.config.invitation_expiry_days);
        let invitation = self
            .invitations
            .replace_for_email(email, role, &token, expires_at, &actor.id)
            .await?;

        let link = format!(
            "{}/accept-invitation?token={}",
            self.config.frontend_url, token
        );
        if let Err(e) = self
            .mailer
            .send(EmailMessage::invitation(email, role.as_str(), &link))
            .await
        {
            // Row is committed; delivery is best-effort.
            tracing::warn!(email, error = %e, "invitation created but email failed");
        }

        Ok(invitation)
    }

    /// Expiry is enforced on read: an expired row is removed here rather
    /// than lingering as pending until someone re-invites the email.
    pub async fn verify_invitation(&self, token: &str) -> Result<InvitationPreview, AuthError> {
        let invitation = self.validate_invitation(token).await?;

        let user_exists = self
            .users
            .find_by_email_any(&invitation.email)
            .await?
            .map(|u| u.is_deleted)
            .unwrap_or(false);

        Ok(InvitationPreview {
            role: invitation.role(),
            email: invitation.email,
            user_exists,
        })
    }

    pub async fn register_from_invitation(
        &self,
        token: &str,
        input: AcceptInvitationInput,
    ) -> Result<User, AuthError> {
        let invitation = self.validate_invitation(token).await?;
        let password_hash = hashing::hash_password(&input.password)?;

        let user_id = match self.users.find_by_email_any(&invitation.email).await? {
            Some(existing) if existing.is_deleted => {
                // Same primary key comes back to life with the invited role.
                self.users
                    .restore_invited(
                        &existing.id,
                        &input.name,
                        input.phone_number.as_deref(),
                        &password_hash,
                        invitation.role(),
                    )
                    .await?;
                existing.id
            }
            Some(_) => return Err(AuthError::EmailInUse),
            None => {
                if let Some(phone) = &input.phone_number {
                    if self.users.phone_taken_by_active(phone).await? {
                        return Err(AuthError::PhoneTaken);
                    }
                }

                let new_user = NewUser {
                    id: Uuid::new_v4().to_string(),
                    name: input.name,
                    email: invitation.email.clone(),
                    phone_number: input.phone_number,
                    password_hash,
                    role: invitation.role(),
                    is_adult: true,
                    is_verified: true,
                };
                self.users.create(&new_user).await?;
                new_user.id
            }
        };

        self.invitations.mark_accepted(&invitation.id).await?;

        self.users
            .find_active_by_id(&user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    async fn validate_invitation(&self, token: &str) -> Result<Invitation, AuthError> {
        let invitation = self
            .invitations
            .find_by_token(token)
            .await?
            .ok_or(AuthError::InvalidInvitation)?;

        if invitation.is_accepted {
            return Err(AuthError::InvalidInvitation);
        }

        if invitation.is_expired(Utc::now()) {
            self.invitations.delete(&invitation.id).await?;
            return Err(AuthError::InvitationExpired);
        }

        Ok(invitation)
    }

    // =========================================================================
    // Role management
    // =========================================================================

    pub async fn change_user_role(
        &self,
        actor: &CurrentUser,
        target_id: &str,
        role: RoleName,
    ) -> Result<User, AuthError> {
        let target = self.manageable_target(actor, target_id).await?;

        if !actor.role.can_manage(role) {
            return Err(AuthError::Forbidden);
        }

        self.users.set_role(target_id, role).await?;

        if let Err(e) = self
            .mailer
            .send(EmailMessage::role_changed(&target.email, role.as_str()))
            .await
        {
            tracing::warn!(user = target_id, error = %e, "role changed but notification failed");
        }

        self.users
            .find_active_by_id(target_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Revocation always lands on `player`; accounts are never deleted here.
    pub async fn revoke_role(
        &self,
        actor: &CurrentUser,
        target_id: &str,
    ) -> Result<User, AuthError> {
        let target = self.manageable_target(actor, target_id).await?;

        self.users.set_role(target_id, RoleName::Player).await?;

        if let Err(e) = self
            .mailer
            .send(EmailMessage::role_revoked(&target.email))
            .await
        {
            tracing::warn!(user = target_id, error = %e, "role revoked but notification failed");
        }

        self.users
            .find_active_by_id(target_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    pub async fn soft_delete_user(
        &self,
        actor: &CurrentUser,
        target_id: &str,
    ) -> Result<(), AuthError> {
        self.manageable_target(actor, target_id).await?;
        self.users.soft_delete(target_id, Utc::now()).await?;
        Ok(())
    }

    /// Shared gate for role mutations: never self, admin tier only, and
    /// the target's current role must be within the actor's reach.
    async fn manageable_target(
        &self,
        actor: &CurrentUser,
        target_id: &str,
    ) -> Result<User, AuthError> {
        if actor.id == target_id {
            return Err(AuthError::SelfRoleChange);
        }

        if !actor.role.is_admin() {
            return Err(AuthError::Forbidden);
        }

        let target = self
            .users
            .find_active_by_id(target_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !actor.role.can_manage(target.role()) {
            return Err(AuthError::Forbidden);
        }

        Ok(target)
    }

    // =========================================================================
    // Password reset
    // =========================================================================

    /// Uniform success whether or not the email exists.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let Some(user) = self.users.find_active_by_email(email).await? else {
            return Ok(());
        };

        let token = random_token();
        let expiry = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);
        self.users
            .set_reset_token(&user.id, &hashing::sha256_hex(&token), expiry)
            .await?;

        let link = format!("{}/reset-password?token={}", self.config.frontend_url, token);
        if let Err(e) = self
            .mailer
            .send(EmailMessage::password_reset(email, &link))
            .await
        {
            tracing::warn!(error = %e, "password reset email failed");
        }

        Ok(())
    }

    pub async fn verify_reset_token(&self, token: &str) -> Result<User, AuthError> {
        self.users
            .find_by_valid_reset_token(&hashing::sha256_hex(token), Utc::now())
            .await?
            .ok_or(AuthError::InvalidResetToken)
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        let user = self.verify_reset_token(token).await?;

        let password_hash = hashing::hash_password(new_password)?;
        self.users.set_password(&user.id, &password_hash).await?;
        self.users.mark_reset_token_used(&user.id).await?;

        Ok(())
    }
}

fn random_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    hex::encode(bytes)
}
