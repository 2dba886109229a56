use axum::{middleware, routing::get, Router};
use std::sync::Arc;

use crate::middleware::auth::{require_admin, require_auth};
use crate::AppState;

use super::controller;

pub fn admin_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/dashboard", get(controller::dashboard))
        .route("/games", get(controller::list_games))
        .route("/games/popularity", get(controller::games_popularity))
        .route("/games/{id}/analytics", get(controller::game_analytics))
        .route("/users", get(controller::list_users))
        .route("/users/activity", get(controller::user_activity))
        .route("/users/{id}/analytics", get(controller::user_analytics))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state, require_auth))
}
