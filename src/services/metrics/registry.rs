use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Central metrics registry for the portal
pub struct MetricsRegistry {
    registry: Registry,

    // HTTP Metrics
    pub http_requests_total: CounterVec,
    pub http_request_duration_seconds: HistogramVec,

    // Auth Metrics
    pub logins_total: CounterVec,
    pub otp_issued_total: CounterVec,
    pub otp_verified_total: CounterVec,
    pub invitations_created_total: CounterVec,
    pub password_resets_total: CounterVec,

    // Gameplay Metrics
    pub game_sessions_started_total: CounterVec,
    pub signup_clicks_total: CounterVec,

    // Cache Metrics
    pub cache_operations_total: CounterVec,
}

impl MetricsRegistry {
    pub fn new() -> Result<Arc<Self>, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total = CounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests").namespace("portal"),
            &["method", "endpoint", "status"],
        )?;
        registry.register(Box::new(http_requests_total.clone()))?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new("http_request_duration_seconds", "HTTP request duration")
                .namespace("portal")
                .buckets(vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
            &["method", "endpoint"],
        )?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;

        let logins_total = CounterVec::new(
            Opts::new("logins_total", "Login attempts by outcome").namespace("portal"),
            &["result"],
        )?;
        registry.register(Box::new(logins_total.clone()))?;

        let otp_issued_total = CounterVec::new(
            Opts::new("otp_issued_total", "One-time codes issued by channel").namespace("portal"),
            &["channel"],
        )?;
        registry.register(Box::new(otp_issued_total.clone()))?;

        let otp_verified_total = CounterVec::new(
            Opts::new("otp_verified_total", "OTP verification attempts by outcome")
                .namespace("portal"),
            &["result"],
        )?;
        registry.register(Box::new(otp_verified_total.clone()))?;

        let invitations_created_total = CounterVec::new(
            Opts::new("invitations_created_total", "Invitations created by target role")
                .namespace("portal"),
            &["role"],
        )?;
        registry.register(Box::new(invitations_created_total.clone()))?;

        let password_resets_total = CounterVec::new(
            Opts::new("password_resets_total", "Password reset flow events").namespace("portal"),
            &["stage"],
        )?;
        registry.register(Box::new(password_resets_total.clone()))?;

        let game_sessions_started_total = CounterVec::new(
            Opts::new("game_sessions_started_total", "Game sessions started").namespace("portal"),
            &["activity"],
        )?;
        registry.register(Box::new(game_sessions_started_total.clone()))?;

        let signup_clicks_total = CounterVec::new(
            Opts::new("signup_clicks_total", "Signup clicks recorded by source")
                .namespace("portal"),
            &["source"],
        )?;
        registry.register(Box::new(signup_clicks_total.clone()))?;

        let cache_operations_total = CounterVec::new(
            Opts::new("cache_operations_total", "TTL cache operations").namespace("portal"),
            &["operation", "result"],
        )?;
        registry.register(Box::new(cache_operations_total.clone()))?;

        Ok(Arc::new(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            logins_total,
            otp_issued_total,
            otp_verified_total,
            invitations_created_total,
            password_resets_total,
            game_sessions_started_total,
            signup_clicks_total,
            cache_operations_total,
        }))
    }

    /// Export metrics in Prometheus text format
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
