use axum::{routing::get, Router};
use std::sync::Arc;

use crate::AppState;

use super::controller;

pub fn games_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(controller::list_games))
        .route("/{id}", get(controller::get_game))
}
