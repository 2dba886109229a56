use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::middleware::auth::CurrentUser;
use crate::modules::auth::schema::ErrorResponse;
use crate::modules::games::crud::GameCrud;
use crate::AppState;

use super::crud::{GroupColumn, SignupClickCrud};
use super::schema::{
    AcceptedResponse, SignupClickRequest, SignupSummaryResponse, StartSessionRequest,
    StartSessionResponse, SummaryQuery,
};
use super::worker::{SessionJob, SignupClickJob, SESSION_QUEUE, SIGNUP_QUEUE};

const SUMMARY_CACHE_PREFIX: &str = "signup-clicks:";

type ApiError = (StatusCode, Json<ErrorResponse>);

fn internal(message: impl ToString) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(message.to_string())),
    )
}

pub async fn start_session(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<StartSessionRequest>,
) -> Result<(StatusCode, Json<StartSessionResponse>), ApiError> {
    let game = GameCrud::new(state.db.clone())
        .find_by_id(&req.game_id)
        .await
        .map_err(internal)?;
    if game.is_none() {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("Game not found")),
        ));
    }

    let session_id = Uuid::new_v4().to_string();
    let job = SessionJob::Start {
        id: session_id.clone(),
        user_id: current.id,
        game_id: req.game_id,
        activity_type: req.activity_type.clone(),
        started_at: Utc::now(),
    };

    state
        .jobs
        .enqueue(SESSION_QUEUE, serde_json::to_value(&job).map_err(internal)?)
        .map_err(internal)?;

    state
        .metrics
        .game_sessions_started_total
        .with_label_values(&[&req.activity_type])
        .inc();

    Ok((
        StatusCode::ACCEPTED,
        Json(StartSessionResponse { session_id }),
    ))
}

pub async fn end_session(
    State(state): State<Arc<AppState>>,
    Extension(_current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<AcceptedResponse>), ApiError> {
    let job = SessionJob::End {
        id,
        ended_at: Utc::now(),
    };

    state
        .jobs
        .enqueue(SESSION_QUEUE, serde_json::to_value(&job).map_err(internal)?)
        .map_err(internal)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(AcceptedResponse {
            message: "Session close queued",
        }),
    ))
}

pub async fn record_signup_click(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<SignupClickRequest>,
) -> Result<(StatusCode, Json<AcceptedResponse>), ApiError> {
    let ip = client_ip(&headers);
    let country = state
        .geoip
        .lookup_country(&ip)
        .unwrap_or_else(|| "Unknown".to_string());

    let job = SignupClickJob {
        id: Uuid::new_v4().to_string(),
        session_id: req.session_id,
        ip_address: ip,
        country,
        device_type: req.device_type,
        source: req.source.clone(),
        created_at: Utc::now(),
    };

    state
        .jobs
        .enqueue(SIGNUP_QUEUE, serde_json::to_value(&job).map_err(internal)?)
        .map_err(internal)?;

    // Any new click invalidates every cached summary
    let removed = state
        .cache
        .delete_by_pattern(&format!("{}*", SUMMARY_CACHE_PREFIX))
        .await;
    state
        .metrics
        .cache_operations_total
        .with_label_values(&["invalidate", if removed > 0 { "hit" } else { "miss" }])
        .inc();

    state
        .metrics
        .signup_clicks_total
        .with_label_values(&[&req.source])
        .inc();

    Ok((
        StatusCode::ACCEPTED,
        Json(AcceptedResponse {
            message: "Click recorded",
        }),
    ))
}

pub async fn signup_summary(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<SignupSummaryResponse>, ApiError> {
    let cache_key = format!(
        "{}summary:{}:{}",
        SUMMARY_CACHE_PREFIX,
        query.from.map(|t| t.to_rfc3339()).unwrap_or_default(),
        query.to.map(|t| t.to_rfc3339()).unwrap_or_default(),
    );

    if let Some(cached) = state.cache.get(&cache_key).await {
        if let Ok(summary) = serde_json::from_str::<SignupSummaryResponse>(&cached) {
            state
                .metrics
                .cache_operations_total
                .with_label_values(&["get", "hit"])
                .inc();
            return Ok(Json(summary));
        }
    }
    state
        .metrics
        .cache_operations_total
        .with_label_values(&["get", "miss"])
        .inc();

    let clicks = SignupClickCrud::new(state.db.clone());
    let summary = SignupSummaryResponse {
        total: clicks.total(query.from, query.to).await.map_err(internal)?,
        by_country: clicks
            .count_grouped(GroupColumn::Country, query.from, query.to)
            .await
            .map_err(internal)?,
        by_device: clicks
            .count_grouped(GroupColumn::DeviceType, query.from, query.to)
            .await
            .map_err(internal)?,
        by_source: clicks
            .count_grouped(GroupColumn::Source, query.from, query.to)
            .await
            .map_err(internal)?,
    };

    if let Ok(serialized) = serde_json::to_string(&summary) {
        state
            .cache
            .set(
                &cache_key,
                serialized,
                Duration::from_secs(state.config.signup_cache_ttl_secs),
            )
            .await;
    }

    Ok(Json(summary))
}

/// First hop of x-forwarded-for; the portal always sits behind a proxy.
fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}
