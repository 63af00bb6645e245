//! In-process FIFO job queue feeding a single worker.
//!
//! The queue is an unbounded channel. [`JobQueue::start`] hands the receiving end
//! to one spawned worker task, so jobs run one at a time in insertion order.
//! Nothing is persisted: jobs still queued when the process exits are lost.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::worker::{run_worker, JobHandler};

pub type JobId = String;

/// A unit of queued work. Consumed exactly once by the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: JobId,
    pub meeting_id: String,
}

impl Job {
    fn new(meeting_id: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            meeting_id: meeting_id.to_string(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("job queue not initialized")]
    NotInitialized,

    #[error("job queue is shut down")]
    Closed,
}

#[derive(Debug, Default)]
pub(super) struct QueueCounters {
    pub(super) enqueued: AtomicU64,
    pub(super) processed: AtomicU64,
    pub(super) failed: AtomicU64,
}

/// Point-in-time view of the queue, for health reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub running: bool,
    /// Queued plus in flight.
    pub pending: u64,
    pub processed: u64,
    pub failed: u64,
}

enum Intake {
    NotStarted,
    Open(mpsc::UnboundedSender<Job>),
    Closed,
}

struct QueueInner {
    intake: Mutex<Intake>,
    counters: Arc<QueueCounters>,
}

/// Cheap to clone; all clones share one queue.
#[derive(Clone)]
pub struct JobQueue {
    inner: Arc<QueueInner>,
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl JobQueue {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(QueueInner {
                intake: Mutex::new(Intake::NotStarted),
                counters: Arc::new(QueueCounters::default()),
            }),
        }
    }

    fn intake(&self) -> MutexGuard<'_, Intake> {
        self.inner
            .intake
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Spawn the worker. Returns `None` if the queue was already started or
    /// has been shut down. Must be called from within a tokio runtime.
    pub fn start(&self, handler: Arc<dyn JobHandler>) -> Option<JoinHandle<()>> {
        let mut intake = self.intake();
        if !matches!(*intake, Intake::NotStarted) {
            return None;
        }

        let (tx, rx) = mpsc::unbounded_channel();
        *intake = Intake::Open(tx);
        drop(intake);

        info!("In-memory job queue started");
        Some(tokio::spawn(run_worker(
            rx,
            handler,
            self.inner.counters.clone(),
        )))
    }

    pub fn enqueue(&self, meeting_id: &str) -> Result<JobId, QueueError> {
        let intake = self.intake();
        let tx = match &*intake {
            Intake::NotStarted => return Err(QueueError::NotInitialized),
            Intake::Closed => return Err(QueueError::Closed),
            Intake::Open(tx) => tx,
        };

        let job = Job::new(meeting_id);
        let job_id = job.id.clone();
        let counters = &self.inner.counters;
        counters.enqueued.fetch_add(1, Ordering::SeqCst);
        if tx.send(job).is_err() {
            counters.enqueued.fetch_sub(1, Ordering::SeqCst);
            return Err(QueueError::Closed);
        }

        debug!("Job {} enqueued for meeting {}", job_id, meeting_id);
        Ok(job_id)
    }

    /// Stop accepting jobs. The worker finishes what is already queued, then exits.
    pub fn shutdown(&self) {
        let mut intake = self.intake();
        if matches!(*intake, Intake::Open(_)) {
            info!("Job queue intake closed");
        }
        *intake = Intake::Closed;
    }

    pub fn stats(&self) -> QueueStats {
        let counters = &self.inner.counters;
        let enqueued = counters.enqueued.load(Ordering::SeqCst);
        let processed = counters.processed.load(Ordering::SeqCst);
        let failed = counters.failed.load(Ordering::SeqCst);

        QueueStats {
            running: matches!(*self.intake(), Intake::Open(_)),
            pending: enqueued.saturating_sub(processed + failed),
            processed,
            failed,
        }
    }
}
