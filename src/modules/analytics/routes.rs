use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::middleware::auth::{require_admin, require_auth};
use crate::AppState;

use super::controller;

pub fn analytics_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let sessions = Router::new()
        .route("/sessions", post(controller::start_session))
        .route("/sessions/{id}/end", post(controller::end_session))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let summary = Router::new()
        .route("/signup-clicks/summary", get(controller::signup_summary))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state, require_auth));

    // Click tracking is anonymous by design
    let public = Router::new().route("/signup-clicks", post(controller::record_signup_click));

    sessions.merge(summary).merge(public)
}
