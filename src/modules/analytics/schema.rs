use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    pub game_id: String,
    pub activity_type: String,
}

#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct SignupClickRequest {
    pub session_id: String,
    pub device_type: String,
    /// UI origin of the click (hero button, navbar, footer, ...)
    pub source: String,
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CountEntry {
    pub key: String,
    pub count: i64,
}

/// Cached as serialized JSON, so this round-trips through serde.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SignupSummaryResponse {
    pub total: i64,
    pub by_country: Vec<CountEntry>,
    pub by_device: Vec<CountEntry>,
    pub by_source: Vec<CountEntry>,
}
