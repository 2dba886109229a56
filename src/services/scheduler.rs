use chrono::{Duration, Utc};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::config::DbPool;

/// Starts the daily maintenance schedule. Currently one job: deactivate
/// accounts that have not been seen for the configured threshold.
/// Failures are logged and swallowed; the next run starts fresh.
pub async fn start_scheduler(
    pool: DbPool,
    inactivity_threshold_days: i64,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    let sweep_pool = pool.clone();
    let sweep = Job::new_async("0 0 3 * * *", move |_uuid, _lock| {
        let pool = sweep_pool.clone();
        Box::pin(async move {
            match deactivate_inactive_users(&pool, inactivity_threshold_days).await {
                Ok(0) => tracing::info!("inactivity sweep: nothing to deactivate"),
                Ok(n) => tracing::info!(deactivated = n, "inactivity sweep complete"),
                Err(e) => tracing::error!(error = %e, "inactivity sweep failed"),
            }
        })
    })?;

    scheduler.add(sweep).await?;
    scheduler.start().await?;

    tracing::info!("scheduler started (daily inactivity sweep at 03:00)");
    Ok(scheduler)
}

/// Flags users inactive when they have not been seen since the cutoff.
/// Idempotent: already-inactive and deleted accounts are never touched.
/// Reactivation happens silently on the next successful login.
pub async fn deactivate_inactive_users(
    pool: &DbPool,
    threshold_days: i64,
) -> Result<u64, sqlx::Error> {
    let cutoff = Utc::now() - Duration::days(threshold_days);

    let result = sqlx::query(
        r#"
        UPDATE users
        SET is_active = 0, updated_at = ?
        WHERE is_deleted = 0
          AND is_active = 1
          AND COALESCE(last_seen, last_logged_in, created_at) < ?
        "#,
    )
    .bind(Utc::now())
    .bind(cutoff)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
