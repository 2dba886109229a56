pub mod config;
pub mod middleware;
pub mod modules;
pub mod services;

use axum::{routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use config::{Config, DbPool};
use modules::admin::admin_routes;
use modules::analytics::{analytics_routes, register_workers};
use modules::auth::{auth_routes, AuthService};
use modules::games::games_routes;
use modules::metrics::metrics_routes;
use modules::otp::OtpService;
use services::cache::TtlCache;
use services::email::EmailSender;
use services::geoip::{GeoIpResolver, NoopGeoIp};
use services::jobs::{job_queue, JobQueue};
use services::jwt::JwtService;
use services::metrics::{metrics_middleware, MetricsRegistry};
use services::rate_limit::{create_rate_limiter, RateLimitLayer};
use services::security::security_headers;
use services::twilio::TwilioVerifyClient;

pub struct AppState {
    pub db: DbPool,
    pub config: Arc<Config>,
    pub jwt_service: JwtService,
    pub auth_service: AuthService,
    pub otp_service: OtpService,
    pub cache: TtlCache,
    pub jobs: JobQueue,
    pub metrics: Arc<MetricsRegistry>,
    pub geoip: Arc<dyn GeoIpResolver>,
}

pub async fn create_app(db: DbPool, config: Arc<Config>, mailer: Arc<dyn EmailSender>) -> Router {
    let twilio = config
        .twilio
        .clone()
        .map(|cfg| Arc::new(TwilioVerifyClient::new(reqwest::Client::new(), cfg)));

    // Out-of-band analytics writes drain through this queue
    let (jobs, mut runner) = job_queue();
    register_workers(&mut runner, db.clone());
    tokio::spawn(runner.run());

    let metrics = MetricsRegistry::new().expect("Failed to build metrics registry");

    let state = Arc::new(AppState {
        db: db.clone(),
        config: config.clone(),
        jwt_service: JwtService::new(config.jwt_secret.clone()),
        auth_service: AuthService::new(db.clone(), config.clone(), mailer.clone()),
        otp_service: OtpService::new(db, config.clone(), mailer, twilio),
        cache: TtlCache::new(),
        jobs,
        metrics: metrics.clone(),
        geoip: Arc::new(NoopGeoIp),
    });

    let rate_limiter = create_rate_limiter(config.rate_limit_burst);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/auth", auth_routes(state.clone()))
        .nest("/games", games_routes())
        .nest("/analytics", analytics_routes(state.clone()))
        .nest("/admin", admin_routes(state.clone()))
        .merge(metrics_routes())
        .layer(axum::middleware::from_fn_with_state(metrics, metrics_middleware))
        .layer(axum::middleware::from_fn(security_headers))
        .layer(RequestBodyLimitLayer::new(1024 * 100)) // 100KB max body
        .layer(RateLimitLayer::new(rate_limiter))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> &'static str {
    "Game Portal API"
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
