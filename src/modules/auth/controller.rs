use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::middleware::auth::CurrentUser;
use crate::modules::otp::{OtpChannel, OtpError};
use crate::AppState;

use super::model::RoleName;
use super::schema::{
    AcceptInvitationRequest, ChangeRoleRequest, ErrorResponse, ForgotPasswordRequest,
    InviteRequest, LoginRequest, LoginResponse, MessageResponse, RefreshTokenRequest,
    RegisterRequest, RegisterResponse, ResetPasswordRequest, TokenResponse, UserResponse,
    VerifyInvitationResponse, VerifyOtpRequest, VerifyResetTokenResponse,
};
use super::service::{AcceptInvitationInput, AuthError, RegisterPlayerInput};

type ApiError = (StatusCode, Json<ErrorResponse>);

fn auth_error(e: AuthError) -> ApiError {
    (e.status_code(), Json(ErrorResponse::new(e.to_string())))
}

fn otp_error(e: OtpError) -> ApiError {
    (e.status_code(), Json(ErrorResponse::new(e.to_string())))
}

fn bad_request(message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message)))
}

fn check_password(password: &str, confirm: &str) -> Result<(), ApiError> {
    if password != confirm {
        return Err(bad_request("Passwords do not match"));
    }
    if password.len() < 8 {
        return Err(bad_request("Password must be at least 8 characters"));
    }
    Ok(())
}

fn parse_role(raw: &str) -> Result<RoleName, ApiError> {
    RoleName::parse(raw).ok_or_else(|| bad_request(format!("Unknown role: {}", raw)))
}

// =============================================================================
// Registration & login
// =============================================================================

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    if let Err(e) = req.validate() {
        return Err(bad_request(e.to_string()));
    }
    check_password(&req.password, &req.password_confirm)?;

    let user = state
        .auth_service
        .register_player(RegisterPlayerInput {
            name: req.name,
            email: req.email,
            phone_number: req.phone_number,
            password: req.password,
            is_adult: req.is_adult,
        })
        .await
        .map_err(auth_error)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: UserResponse::from(&user),
        }),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let channel = match req.otp_channel.as_deref() {
        Some(raw) => OtpChannel::parse(raw)
            .ok_or_else(|| bad_request(format!("Unknown OTP channel: {}", raw)))?,
        None => OtpChannel::Email,
    };

    let user = state
        .auth_service
        .login(&req.identifier, &req.password)
        .await
        .map_err(|e| {
            if matches!(e, AuthError::InvalidCredentials) {
                state.metrics.logins_total.with_label_values(&["invalid"]).inc();
            }
            auth_error(e)
        })?;

    let code = state
        .otp_service
        .generate(&user.id, channel)
        .await
        .map_err(otp_error)?;
    state
        .otp_service
        .send(&user.id, &code, channel)
        .await
        .map_err(otp_error)?;

    state.metrics.logins_total.with_label_values(&["success"]).inc();
    state
        .metrics
        .otp_issued_total
        .with_label_values(&[channel.as_str()])
        .inc();

    Ok(Json(LoginResponse {
        user_id: user.id,
        email: user.email,
        phone_number: user.phone_number,
        requires_otp: true,
    }))
}

pub async fn verify_otp(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyOtpRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let verified = state
        .otp_service
        .verify(&req.user_id, &req.otp)
        .await
        .map_err(otp_error)?;

    if !verified {
        state
            .metrics
            .otp_verified_total
            .with_label_values(&["rejected"])
            .inc();
        return Err(bad_request("Invalid or expired OTP"));
    }
    state
        .metrics
        .otp_verified_total
        .with_label_values(&["verified"])
        .inc();

    let user = state
        .auth_service
        .get_user(&req.user_id)
        .await
        .map_err(auth_error)?;

    issue_tokens(&state, &user.id, &user.email, &user.role_name)
}

pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshTokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let data = state
        .jwt_service
        .verify_refresh_token(&req.refresh_token)
        .map_err(|_| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new("Invalid or expired refresh token")),
            )
        })?;

    let user = state
        .auth_service
        .get_user(&data.claims.sub)
        .await
        .map_err(auth_error)?;

    issue_tokens(&state, &user.id, &user.email, &user.role_name)
}

fn issue_tokens(
    state: &AppState,
    user_id: &str,
    email: &str,
    role: &str,
) -> Result<Json<TokenResponse>, ApiError> {
    let internal = |e: jsonwebtoken::errors::Error| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(e.to_string())),
        )
    };

    let access_token = state
        .jwt_service
        .create_access_token(user_id, email, role)
        .map_err(internal)?;
    let refresh_token = state
        .jwt_service
        .create_refresh_token(user_id)
        .map_err(internal)?;

    Ok(Json(TokenResponse {
        access_token,
        refresh_token,
        token_type: "Bearer",
        expires_in: state.jwt_service.get_access_token_duration_secs(),
    }))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .auth_service
        .get_user(&current.id)
        .await
        .map_err(auth_error)?;

    Ok(Json(UserResponse::from(&user)))
}

// =============================================================================
// Invitations
// =============================================================================

pub async fn invite(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<InviteRequest>,
) -> Result<(StatusCode, Json<super::schema::InviteResponse>), ApiError> {
    if let Err(e) = req.validate() {
        return Err(bad_request(e.to_string()));
    }
    let role = parse_role(&req.role)?;

    let invitation = state
        .auth_service
        .create_invitation(&current, &req.email, role)
        .await
        .map_err(auth_error)?;

    state
        .metrics
        .invitations_created_total
        .with_label_values(&[role.as_str()])
        .inc();

    Ok((
        StatusCode::CREATED,
        Json(super::schema::InviteResponse {
            id: invitation.id,
            email: invitation.email,
            role: invitation.role_name,
            expires_at: invitation.expires_at,
        }),
    ))
}

pub async fn verify_invitation(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<VerifyInvitationResponse>, ApiError> {
    let preview = state
        .auth_service
        .verify_invitation(&token)
        .await
        .map_err(auth_error)?;

    Ok(Json(VerifyInvitationResponse {
        email: preview.email,
        role: preview.role.as_str().to_string(),
        user_exists: preview.user_exists,
    }))
}

pub async fn accept_invitation(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    Json(req): Json<AcceptInvitationRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    check_password(&req.password, &req.password_confirm)?;

    let user = state
        .auth_service
        .register_from_invitation(
            &token,
            AcceptInvitationInput {
                name: req.name,
                phone_number: req.phone_number,
                password: req.password,
            },
        )
        .await
        .map_err(auth_error)?;

    Ok(Json(RegisterResponse {
        user: UserResponse::from(&user),
    }))
}

// =============================================================================
// Role management
// =============================================================================

pub async fn change_role(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(req): Json<ChangeRoleRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let role = parse_role(&req.role)?;

    let user = state
        .auth_service
        .change_user_role(&current, &id, role)
        .await
        .map_err(auth_error)?;

    Ok(Json(UserResponse::from(&user)))
}

pub async fn revoke_role(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .auth_service
        .revoke_role(&current, &id)
        .await
        .map_err(auth_error)?;

    Ok(Json(UserResponse::from(&user)))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .auth_service
        .soft_delete_user(&current, &id)
        .await
        .map_err(auth_error)?;

    Ok(Json(MessageResponse {
        message: "Account deleted",
    }))
}

// =============================================================================
// Password reset
// =============================================================================

pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if req.email.is_empty() || !req.email.contains('@') {
        return Err(bad_request("Invalid email format"));
    }

    state
        .auth_service
        .request_password_reset(&req.email)
        .await
        .map_err(auth_error)?;

    state
        .metrics
        .password_resets_total
        .with_label_values(&["requested"])
        .inc();

    // Identical response whether or not the account exists
    Ok(Json(MessageResponse {
        message: "If the account exists, a reset link has been sent",
    }))
}

pub async fn verify_reset_token(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<VerifyResetTokenResponse>, ApiError> {
    let user = state
        .auth_service
        .verify_reset_token(&token)
        .await
        .map_err(auth_error)?;

    Ok(Json(VerifyResetTokenResponse { email: user.email }))
}

pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    check_password(&req.password, &req.password_confirm)?;

    state
        .auth_service
        .reset_password(&req.token, &req.password)
        .await
        .map_err(auth_error)?;

    state
        .metrics
        .password_resets_total
        .with_label_values(&["completed"])
        .inc();

    Ok(Json(MessageResponse {
        message: "Password updated",
    }))
}
