use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Jobs are retried this many times in total before being dropped.
const MAX_ATTEMPTS: u32 = 3;

const RETRY_DELAY_MS: u64 = 100;

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Job failed: {0}")]
    Failed(String),

    #[error("Job queue is closed")]
    QueueClosed,
}

type BoxedJobFuture = Pin<Box<dyn Future<Output = Result<(), JobError>> + Send>>;
type JobHandler = Arc<dyn Fn(Value) -> BoxedJobFuture + Send + Sync>;

struct QueuedJob {
    queue: String,
    payload: Value,
    attempt: u32,
}

/// Producer half. Cheap to clone; held by `AppState`.
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::UnboundedSender<QueuedJob>,
}

impl JobQueue {
    pub fn enqueue(&self, queue: &str, payload: Value) -> Result<(), JobError> {
        self.tx
            .send(QueuedJob {
                queue: queue.to_string(),
                payload,
                attempt: 1,
            })
            .map_err(|_| JobError::QueueClosed)
    }
}

/// Consumer half: a registry of named workers plus the dispatch loop.
/// At-least-once semantics; a failing handler is re-enqueued with a short
/// delay until `MAX_ATTEMPTS` is exhausted.
pub struct JobRunner {
    handlers: HashMap<String, JobHandler>,
    tx: mpsc::UnboundedSender<QueuedJob>,
    rx: mpsc::UnboundedReceiver<QueuedJob>,
}

pub fn job_queue() -> (JobQueue, JobRunner) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        JobQueue { tx: tx.clone() },
        JobRunner {
            handlers: HashMap::new(),
            tx,
            rx,
        },
    )
}

impl JobRunner {
    pub fn create_worker<F, Fut>(&mut self, queue: &str, handler: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), JobError>> + Send + 'static,
    {
        self.handlers.insert(
            queue.to_string(),
            Arc::new(move |payload| -> BoxedJobFuture { Box::pin(handler(payload)) }),
        );
    }

    /// Dispatch loop; spawn once at startup and leave running.
    pub async fn run(mut self) {
        while let Some(job) = self.rx.recv().await {
            let Some(handler) = self.handlers.get(&job.queue) else {
                tracing::error!(queue = %job.queue, "dropping job for unregistered queue");
                continue;
            };

            match (handler.as_ref())(job.payload.clone()).await {
                Ok(()) => {}
                Err(e) if job.attempt < MAX_ATTEMPTS => {
                    tracing::warn!(
                        queue = %job.queue,
                        attempt = job.attempt,
                        error = %e,
                        "job failed, re-enqueueing"
                    );
                    let tx = self.tx.clone();
                    let retry = QueuedJob {
                        queue: job.queue,
                        payload: job.payload,
                        attempt: job.attempt + 1,
                    };
                    tokio::spawn(async move {
                        tokio::time::sleep(std::time::Duration::from_millis(
                            RETRY_DELAY_MS * u64::from(retry.attempt),
                        ))
                        .await;
                        let _ = tx.send(retry);
                    });
                }
                Err(e) => {
                    tracing::error!(
                        queue = %job.queue,
                        attempts = job.attempt,
                        error = %e,
                        "job failed permanently"
                    );
                }
            }
        }
    }
}
