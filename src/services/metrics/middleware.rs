use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;

use super::MetricsRegistry;

/// Middleware to collect HTTP request metrics
pub async fn metrics_middleware(
    State(metrics): State<Arc<MetricsRegistry>>,
    req: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = normalize_path(req.uri().path());

    let response = next.run(req).await;

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    metrics
        .http_requests_total
        .with_label_values(&[&method, &path, &status])
        .inc();

    metrics
        .http_request_duration_seconds
        .with_label_values(&[&method, &path])
        .observe(duration);

    response
}

/// Collapse ids and tokens so endpoint labels stay low-cardinality:
/// /admin/games/<uuid>/analytics -> /admin/games/:id/analytics
fn normalize_path(path: &str) -> String {
    let mut normalized = Vec::new();

    for segment in path.split('/') {
        if segment.is_empty() {
            continue;
        }
        if is_opaque(segment) {
            normalized.push(":id");
        } else {
            normalized.push(segment);
        }
    }

    format!("/{}", normalized.join("/"))
}

/// UUIDs, numeric ids and hex tokens count as opaque path material.
fn is_opaque(segment: &str) -> bool {
    if segment.len() == 36 && segment.chars().filter(|c| *c == '-').count() == 4 {
        return true;
    }

    if segment.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }

    // Invitation and reset tokens are long hex strings
    if segment.len() >= 32 && segment.chars().all(|c| c.is_ascii_hexdigit()) {
        return true;
    }

    false
}
