use chrono::{DateTime, Duration, Utc};

/// A reporting window pair: the current period and the equally-sized
/// period immediately before it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodWindows {
    pub current_start: DateTime<Utc>,
    pub current_end: DateTime<Utc>,
    pub previous_start: DateTime<Utc>,
    pub previous_end: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum PeriodError {
    #[error("Unknown period: {0}")]
    UnknownPeriod(String),

    #[error("Custom period requires both start and end")]
    MissingCustomRange,

    #[error("Custom period end must be after start")]
    EmptyCustomRange,
}

/// `last7days` means current = [now-7d, now] and previous = [now-14d,
/// now-7d]; custom ranges shift back by their own span.
pub fn resolve_windows(
    period: &str,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<PeriodWindows, PeriodError> {
    let (current_start, current_end) = match period {
        "last24hours" => (now - Duration::days(1), now),
        "last7days" => (now - Duration::days(7), now),
        "last30days" => (now - Duration::days(30), now),
        "custom" => {
            let (start, end) = match (start, end) {
                (Some(start), Some(end)) => (start, end),
                _ => return Err(PeriodError::MissingCustomRange),
            };
            if end <= start {
                return Err(PeriodError::EmptyCustomRange);
            }
            (start, end)
        }
        other => return Err(PeriodError::UnknownPeriod(other.to_string())),
    };

    let span = current_end - current_start;
    Ok(PeriodWindows {
        current_start,
        current_end,
        previous_start: current_start - span,
        previous_end: current_start,
    })
}

/// Percentage change clamped to [-100, 100]. An empty previous period is
/// reported as flat rather than infinite growth.
pub fn pct_change(current: i64, previous: i64) -> f64 {
    if previous == 0 {
        return 0.0;
    }
    let raw = (current - previous) as f64 / previous as f64 * 100.0;
    raw.clamp(-100.0, 100.0)
}
