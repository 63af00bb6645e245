//! The pipeline orchestrator.
//!
//! Creation, queued jobs, auto-fallback reads and forced recomputes all go
//! through [`MeetingPipeline::run`]: fetch the record fresh, call the completion
//! gateway, write the result in one update, then try the embedding side channel.
//!
//! Inline paths may run concurrently with each other and with the worker. Writes
//! to the same record are last-write-wins; the only guards are the skip rule for
//! queued jobs and the conditional `mark_failed` in the store.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::error::PipelineError;
use super::record::{Meeting, MeetingUpdate};
use super::status::MeetingStatus;
use super::store::MeetingStore;
use crate::completion::CompletionGateway;
use crate::embedding::EmbeddingSideChannel;
use crate::jobs::{Job, JobHandler, JobQueue, QueueStats};

pub const DEFAULT_LIST_LIMIT: usize = 20;
pub const MAX_LIST_LIMIT: usize = 100;

/// What created the current processing attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Create,
    Queued,
    AutoFallback,
    Force,
}

impl Trigger {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Queued => "queued job",
            Self::AutoFallback => "auto-fallback",
            Self::Force => "force recompute",
        }
    }
}

/// Result of [`MeetingPipeline::create_meeting`].
#[derive(Debug, Clone)]
pub struct CreateOutcome {
    pub meeting: Meeting,
    /// True when the record was queued and is still `processing`.
    pub processing: bool,
}

#[derive(Clone)]
pub struct MeetingPipeline {
    store: Arc<dyn MeetingStore>,
    completion: Arc<dyn CompletionGateway>,
    embeddings: EmbeddingSideChannel,
    queue: Option<JobQueue>,
}

impl MeetingPipeline {
    /// `queue: None` selects synchronous creation.
    pub fn new(
        store: Arc<dyn MeetingStore>,
        completion: Arc<dyn CompletionGateway>,
        embeddings: EmbeddingSideChannel,
        queue: Option<JobQueue>,
    ) -> Self {
        Self {
            store,
            completion,
            embeddings,
            queue,
        }
    }

    pub fn jobs_enabled(&self) -> bool {
        self.queue.is_some()
    }

    pub fn embeddings_enabled(&self) -> bool {
        self.embeddings.is_enabled()
    }

    pub fn completion_name(&self) -> &'static str {
        self.completion.name()
    }

    pub fn queue_stats(&self) -> Option<QueueStats> {
        self.queue.as_ref().map(JobQueue::stats)
    }

    /// Persist a new meeting and either queue it or summarize it inline.
    ///
    /// If the queue rejects the job the meeting is processed inline instead, so
    /// only a successful enqueue returns a `processing` record.
    ///
    /// Inline processing still inserts the record as `processing` first. Until the
    /// completion call writes `ready` or `failed`, concurrent `get_meeting` and
    /// `list_meetings` callers can observe that intermediate state.
    pub async fn create_meeting(
        &self,
        title: &str,
        transcript: &str,
    ) -> Result<CreateOutcome, PipelineError> {
        let meeting = self
            .store
            .insert(&Meeting::new(title, transcript, MeetingStatus::Processing))
            .await?;
        info!("Meeting {} created: {}", meeting.id, meeting.title);

        if let Some(queue) = &self.queue {
            match queue.enqueue(&meeting.id) {
                Ok(job_id) => {
                    info!("Meeting {} queued as job {}", meeting.id, job_id);
                    return Ok(CreateOutcome {
                        meeting,
                        processing: true,
                    });
                }
                Err(e) => warn!(
                    "Could not queue meeting {} ({}), processing inline",
                    meeting.id, e
                ),
            }
        }

        let meeting = self
            .run(&meeting.id, Trigger::Create)
            .await?
            .ok_or_else(|| PipelineError::MeetingNotFound(meeting.id.clone()))?;

        Ok(CreateOutcome {
            meeting,
            processing: false,
        })
    }

    /// Entry point for the queue worker. A job whose meeting has disappeared
    /// is an error for the job.
    pub async fn process_job(&self, meeting_id: &str) -> Result<Meeting, PipelineError> {
        self.run(meeting_id, Trigger::Queued)
            .await?
            .ok_or_else(|| PipelineError::MeetingNotFound(meeting_id.to_string()))
    }

    /// Fetch a meeting. With `auto_complete`, an unresolved record is summarized
    /// inline before it is returned.
    pub async fn get_meeting(
        &self,
        id: &str,
        auto_complete: bool,
    ) -> Result<Option<Meeting>, PipelineError> {
        let Some(meeting) = self.store.get_by_id(id).await? else {
            return Ok(None);
        };

        if auto_complete && meeting.needs_completion() {
            info!(
                "Meeting {} is {} without a result, completing inline",
                id, meeting.status
            );
            return self.run(id, Trigger::AutoFallback).await;
        }

        Ok(Some(meeting))
    }

    /// Newest first. `limit` is clamped to `1..=MAX_LIST_LIMIT`.
    pub async fn list_meetings(&self, limit: usize) -> Result<Vec<Meeting>, PipelineError> {
        let limit = limit.clamp(1, MAX_LIST_LIMIT);
        Ok(self.store.list_recent(limit).await?)
    }

    /// Recompute regardless of current status, overwriting any prior result.
    pub async fn force_recompute(&self, id: &str) -> Result<Option<Meeting>, PipelineError> {
        info!("Force recompute requested for meeting {}", id);
        self.run(id, Trigger::Force).await
    }

    async fn run(&self, id: &str, trigger: Trigger) -> Result<Option<Meeting>, PipelineError> {
        let Some(meeting) = self.store.get_by_id(id).await? else {
            debug!("Meeting {} not found ({})", id, trigger.as_str());
            return Ok(None);
        };

        if trigger == Trigger::Queued && meeting.is_settled() {
            info!("Meeting {} already ready, skipping queued job", id);
            return Ok(Some(meeting));
        }

        debug!(
            "Requesting completion for meeting {} via {} ({})",
            id,
            self.completion.name(),
            trigger.as_str()
        );

        let result = match self
            .completion
            .complete(&meeting.title, &meeting.transcript)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    "Completion failed for meeting {} ({}): {}",
                    id,
                    trigger.as_str(),
                    e
                );
                self.record_failure(id).await;
                return Err(e.into());
            }
        };

        let Some(updated) = self
            .store
            .update_result(id, &MeetingUpdate::ready(result))
            .await?
        else {
            warn!("Meeting {} disappeared before its result was saved", id);
            return Ok(None);
        };
        info!("Meeting {} ready ({})", id, trigger.as_str());

        self.embeddings
            .embed_if_enabled(id, &meeting.transcript)
            .await;

        Ok(Some(updated))
    }

    /// Move the record to `failed` unless it already holds a successful result.
    /// Store errors here are logged; the completion error is what the caller sees.
    async fn record_failure(&self, id: &str) {
        match self.store.get_by_id(id).await {
            Ok(Some(current)) if current.is_settled() => {
                info!("Meeting {} keeps its earlier result after a failed attempt", id);
            }
            Ok(Some(_)) => match self.store.mark_failed(id).await {
                Ok(true) => info!("Meeting {} marked failed", id),
                Ok(false) => debug!("Meeting {} settled concurrently, not marked failed", id),
                Err(e) => warn!("Failed to mark meeting {} as failed: {}", id, e),
            },
            Ok(None) => debug!("Meeting {} gone, nothing to mark failed", id),
            Err(e) => warn!("Failed to re-read meeting {} after failure: {}", id, e),
        }
    }
}

#[async_trait]
impl JobHandler for MeetingPipeline {
    async fn handle(&self, job: &Job) -> anyhow::Result<()> {
        self.process_job(&job.meeting_id).await?;
        Ok(())
    }
}
