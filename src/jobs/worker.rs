//! The single worker draining the job queue.

use async_trait::async_trait;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

use super::queue::{Job, QueueCounters};

/// Processes one job. Errors are logged by the worker and the job is dropped.
#[async_trait]
pub trait JobHandler: Send + Sync + 'static {
    async fn handle(&self, job: &Job) -> anyhow::Result<()>;
}

/// Runs until every sender is gone and the channel is drained.
///
/// Each job runs in its own task and is awaited before the next one is
/// received, so at most one job is in flight and a panicking job cannot take
/// the loop down with it.
pub(super) async fn run_worker(
    mut rx: mpsc::UnboundedReceiver<Job>,
    handler: Arc<dyn JobHandler>,
    counters: Arc<QueueCounters>,
) {
    while let Some(job) = rx.recv().await {
        let job_id = job.id.clone();
        let meeting_id = job.meeting_id.clone();
        let handler = handler.clone();

        let outcome = tokio::spawn(async move { handler.handle(&job).await }).await;

        match outcome {
            Ok(Ok(())) => {
                counters.processed.fetch_add(1, Ordering::SeqCst);
                info!("Job {} done (meeting {})", job_id, meeting_id);
            }
            Ok(Err(e)) => {
                counters.failed.fetch_add(1, Ordering::SeqCst);
                error!("Job {} failed (meeting {}): {:#}", job_id, meeting_id, e);
            }
            Err(e) => {
                counters.failed.fetch_add(1, Ordering::SeqCst);
                error!("Job {} aborted (meeting {}): {}", job_id, meeting_id, e);
            }
        }
    }

    info!("Job worker stopped");
}
