use axum::http::StatusCode;
use chrono::{Duration, Utc};
use rand::Rng;
use std::sync::Arc;

use crate::config::{Config, DbPool};
use crate::modules::auth::crud::UserCrud;
use crate::modules::auth::model::User;
use crate::services::email::{EmailError, EmailMessage, EmailSender};
use crate::services::twilio::TwilioVerifyClient;

use super::crud::OtpCrud;
use super::model::{OtpChannel, TWILIO_VERIFY_SENTINEL};

#[derive(Debug, thiserror::Error)]
pub enum OtpError {
    #[error("User not found")]
    UserNotFound,

    #[error("User has no {0} on file")]
    MissingContact(&'static str),

    #[error("OTP delivery misconfigured: {0}")]
    Misconfigured(&'static str),

    #[error("OTP provider error: {0}")]
    Provider(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Email dispatch failed: {0}")]
    Email(#[from] EmailError),
}

impl OtpError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::MissingContact(_) => StatusCode::BAD_REQUEST,
            Self::Misconfigured(_) | Self::Provider(_) | Self::Database(_) | Self::Email(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Issues and checks one-time codes. Local codes are stored in plaintext
/// for comparison; the SMS path hands ownership to Twilio Verify and only
/// keeps the sentinel.
pub struct OtpService {
    users: UserCrud,
    otps: OtpCrud,
    config: Arc<Config>,
    mailer: Arc<dyn EmailSender>,
    twilio: Option<Arc<TwilioVerifyClient>>,
}

impl OtpService {
    pub fn new(
        pool: DbPool,
        config: Arc<Config>,
        mailer: Arc<dyn EmailSender>,
        twilio: Option<Arc<TwilioVerifyClient>>,
    ) -> Self {
        Self {
            users: UserCrud::new(pool.clone()),
            otps: OtpCrud::new(pool),
            config,
            mailer,
            twilio,
        }
    }

    /// Persists a fresh code and returns the plaintext for dispatch.
    /// Allow-listed test identifiers always get the fixed code.
    pub async fn generate(&self, user_id: &str, channel: OtpChannel) -> Result<String, OtpError> {
        let user = self
            .users
            .find_active_by_id(user_id)
            .await?
            .ok_or(OtpError::UserNotFound)?;

        let code = if self.is_allowlisted(&user) {
            self.config.test_otp_code.clone()
        } else {
            format!("{:06}", rand::rng().random_range(0..1_000_000u32))
        };

        let expires_at = Utc::now() + Duration::minutes(self.config.otp_expiry_minutes);
        self.otps.create(&user, channel, &code, expires_at).await?;

        Ok(code)
    }

    pub async fn send(
        &self,
        user_id: &str,
        code: &str,
        channel: OtpChannel,
    ) -> Result<(), OtpError> {
        let user = self
            .users
            .find_active_by_id(user_id)
            .await?
            .ok_or(OtpError::UserNotFound)?;

        match channel {
            OtpChannel::Email => {
                self.mailer
                    .send(EmailMessage::otp_code(
                        &user.email,
                        code,
                        self.config.otp_expiry_minutes,
                    ))
                    .await?;
            }
            OtpChannel::Sms => {
                let phone = user
                    .phone_number
                    .as_deref()
                    .ok_or(OtpError::MissingContact("phone number"))?;
                let twilio = self
                    .twilio
                    .as_ref()
                    .ok_or(OtpError::Misconfigured("Twilio Verify credentials are not set"))?;

                twilio
                    .start_verification(phone, "sms")
                    .await
                    .map_err(|e| OtpError::Provider(e.to_string()))?;

                // Verify owns the code now; replace ours with the sentinel.
                if let Some(otp) = self.otps.latest_unverified_for_user(user_id).await? {
                    self.otps.set_secret(&otp.id, TWILIO_VERIFY_SENTINEL).await?;
                }
            }
            OtpChannel::None => {}
        }

        Ok(())
    }

    /// `false` covers wrong and expired codes; errors are reserved for
    /// missing users and provider trouble. First success also flips the
    /// account to verified.
    pub async fn verify(&self, user_id: &str, code: &str) -> Result<bool, OtpError> {
        let user = self
            .users
            .find_active_by_id(user_id)
            .await?
            .ok_or(OtpError::UserNotFound)?;

        // Test accounts bypass storage entirely.
        if self.is_allowlisted(&user) && code == self.config.test_otp_code {
            self.users.set_verified(&user.id).await?;
            return Ok(true);
        }

        let Some(otp) = self.otps.latest_unverified_for_user(user_id).await? else {
            return Ok(false);
        };

        if otp.is_expired(Utc::now()) {
            return Ok(false);
        }

        let matches = if otp.uses_twilio_verify() {
            let phone = user
                .phone_number
                .as_deref()
                .ok_or(OtpError::MissingContact("phone number"))?;
            let twilio = self
                .twilio
                .as_ref()
                .ok_or(OtpError::Misconfigured("Twilio Verify credentials are not set"))?;

            twilio
                .check_verification(phone, code)
                .await
                .map_err(|e| OtpError::Provider(e.to_string()))?
        } else {
            otp.secret == code
        };

        if matches {
            self.otps.mark_verified(&otp.id).await?;
            self.users.set_verified(&user.id).await?;
        }

        Ok(matches)
    }

    fn is_allowlisted(&self, user: &User) -> bool {
        self.config.is_test_identifier(&user.email)
            || user
                .phone_number
                .as_deref()
                .map(|p| self.config.is_test_identifier(p))
                .unwrap_or(false)
    }
}
