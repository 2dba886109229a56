use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::modules::auth::crud::UserCrud;
use crate::modules::auth::model::RoleName;
use crate::modules::auth::schema::ErrorResponse;
use crate::AppState;

/// Authenticated identity attached to the request. The role is read back
/// from the database on every request so revocations apply immediately,
/// not at token expiry.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub email: String,
    pub role: RoleName,
}

type AuthRejection = (StatusCode, Json<ErrorResponse>);

fn unauthorized(message: &str) -> AuthRejection {
    (StatusCode::UNAUTHORIZED, Json(ErrorResponse::new(message)))
}

pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthRejection> {
    let token = bearer_token(&request).ok_or_else(|| unauthorized("Missing bearer token"))?;

    let data = state
        .jwt_service
        .verify_access_token(&token)
        .map_err(|_| unauthorized("Invalid or expired token"))?;

    let users = UserCrud::new(state.db.clone());
    let user = users
        .find_active_by_id(&data.claims.sub)
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            )
        })?
        .ok_or_else(|| unauthorized("Account no longer exists"))?;

    // Feeds the inactivity sweep
    if let Err(e) = users.touch_last_seen(&user.id, Utc::now()).await {
        tracing::warn!(user = %user.id, error = %e, "failed to update last_seen");
    }

    request.extensions_mut().insert(CurrentUser {
        role: user.role(),
        id: user.id,
        email: user.email,
    });

    Ok(next.run(request).await)
}

/// Layered after `require_auth` on admin-only routers.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AuthRejection> {
    let current = request
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(|| unauthorized("Missing bearer token"))?;

    if !current.role.is_admin() {
        return Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::new("Admin access required")),
        ));
    }

    Ok(next.run(request).await)
}

fn bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}
