use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

use crate::middleware::auth::require_auth;
use crate::AppState;

use super::controller;

pub fn auth_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let public = Router::new()
        .route("/register", post(controller::register))
        .route("/login", post(controller::login))
        .route("/verify-otp", post(controller::verify_otp))
        .route("/refresh", post(controller::refresh_token))
        .route("/verify-invitation/{token}", get(controller::verify_invitation))
        .route(
            "/reset-password-from-invitation/{token}",
            post(controller::accept_invitation),
        )
        .route("/forgot-password", post(controller::forgot_password))
        .route("/verify-reset-token/{token}", get(controller::verify_reset_token))
        .route("/reset-password", post(controller::reset_password));

    let protected = Router::new()
        .route("/me", get(controller::me))
        .route("/invite", post(controller::invite))
        .route("/users/{id}/role", put(controller::change_role))
        .route("/revoke-role/{id}", put(controller::revoke_role))
        .route("/users/{id}", delete(controller::delete_user))
        .layer(middleware::from_fn_with_state(state, require_auth));

    public.merge(protected)
}
