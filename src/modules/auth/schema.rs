use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::model::User;

// =============================================================================
// REGISTER
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    pub password: String,
    pub password_confirm: String,
    #[serde(default)]
    pub is_adult: bool,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: UserResponse,
}

// =============================================================================
// LOGIN / OTP
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email or phone number; phone when there is no `@`.
    pub identifier: String,
    pub password: String,
    #[serde(default)]
    pub otp_channel: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub requires_otp: bool,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub user_id: String,
    pub otp: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

// =============================================================================
// USER
// =============================================================================

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub is_adult: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            phone_number: user.phone_number.clone(),
            role: user.role_name.clone(),
            is_active: user.is_active,
            is_verified: user.is_verified,
            is_adult: user.is_adult,
            created_at: user.created_at,
        }
    }
}

// =============================================================================
// INVITATIONS
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct InviteRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct InviteResponse {
    pub id: String,
    pub email: String,
    pub role: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct VerifyInvitationResponse {
    pub email: String,
    pub role: String,
    pub user_exists: bool,
}

#[derive(Debug, Deserialize)]
pub struct AcceptInvitationRequest {
    pub name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    pub password: String,
    pub password_confirm: String,
}

// =============================================================================
// ROLE MANAGEMENT
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: String,
}

// =============================================================================
// PASSWORD RESET
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResetTokenResponse {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
    pub password_confirm: String,
}

// =============================================================================
// GENERIC RESPONSES
// =============================================================================

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
        }
    }
}
