//! Queued meeting processing.

mod queue;
mod worker;

pub use queue::{Job, JobId, JobQueue, QueueError, QueueStats};
pub use worker::JobHandler;
