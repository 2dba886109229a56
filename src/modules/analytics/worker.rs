use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::DbPool;
use crate::services::jobs::{JobError, JobRunner};

use super::crud::{SessionCrud, SignupClickCrud};
use super::model::{GameSession, SignupClick};

pub const SESSION_QUEUE: &str = "game-sessions";
pub const SIGNUP_QUEUE: &str = "signup-clicks";

/// Payloads for the out-of-band analytics writes. The HTTP layer
/// allocates ids up front and answers 202 before any row exists.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionJob {
    Start {
        id: String,
        user_id: String,
        game_id: String,
        activity_type: String,
        started_at: DateTime<Utc>,
    },
    End {
        id: String,
        ended_at: DateTime<Utc>,
    },
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignupClickJob {
    pub id: String,
    pub session_id: String,
    pub ip_address: String,
    pub country: String,
    pub device_type: String,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

/// Registers both analytics workers. Errors are returned to the runner,
/// which logs and re-enqueues per its retry policy.
pub fn register_workers(runner: &mut JobRunner, pool: DbPool) {
    let session_pool = pool.clone();
    runner.create_worker(SESSION_QUEUE, move |payload| {
        let pool = session_pool.clone();
        async move {
            let job: SessionJob =
                serde_json::from_value(payload).map_err(|e| JobError::Failed(e.to_string()))?;
            let sessions = SessionCrud::new(pool);

            match job {
                SessionJob::Start {
                    id,
                    user_id,
                    game_id,
                    activity_type,
                    started_at,
                } => {
                    let session = GameSession {
                        id,
                        user_id,
                        game_id,
                        activity_type,
                        started_at,
                        ended_at: None,
                        duration_seconds: None,
                    };
                    sessions
                        .insert_started(&session)
                        .await
                        .map_err(|e| JobError::Failed(e.to_string()))
                }
                SessionJob::End { id, ended_at } => {
                    let closed = sessions
                        .close(&id, ended_at)
                        .await
                        .map_err(|e| JobError::Failed(e.to_string()))?;
                    if !closed {
                        // Start job may still be queued behind us
                        return Err(JobError::Failed(format!("session {} not found", id)));
                    }
                    Ok(())
                }
            }
        }
    });

    runner.create_worker(SIGNUP_QUEUE, move |payload| {
        let pool = pool.clone();
        async move {
            let job: SignupClickJob =
                serde_json::from_value(payload).map_err(|e| JobError::Failed(e.to_string()))?;
            let click = SignupClick {
                id: job.id,
                session_id: job.session_id,
                ip_address: job.ip_address,
                country: job.country,
                device_type: job.device_type,
                source: job.source,
                created_at: job.created_at,
            };
            SignupClickCrud::new(pool)
                .insert(&click)
                .await
                .map_err(|e| JobError::Failed(e.to_string()))
        }
    });
}
