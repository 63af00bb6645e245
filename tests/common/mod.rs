//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use meetnotes::completion::{CompletionError, CompletionGateway, CompletionResult};
use meetnotes::db::SqliteMeetingStore;
use meetnotes::embedding::{CharCodeEmbedder, Embedder, EmbeddingError, EmbeddingSideChannel};
use meetnotes::jobs::{Job, JobHandler, JobQueue};
use meetnotes::meeting::{
    ActionItem, Meeting, MeetingPipeline, MeetingStore, MeetingUpdate, StoreError,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};

pub const TRANSCRIPT: &str =
    "We agreed to ship on Friday. Dana will write the release notes. Sam owns QA.";

/// Numbered answers (`"<title> summary #n"`), optional delay and failure switch.
/// Records call order and the peak number of concurrent calls.
#[derive(Default)]
pub struct ScriptedGateway {
    pub calls: AtomicUsize,
    pub titles: Mutex<Vec<String>>,
    pub peak: AtomicUsize,
    in_flight: AtomicUsize,
    fail: AtomicBool,
    delay: Duration,
}

impl ScriptedGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            ..Self::default()
        })
    }

    pub fn failing() -> Arc<Self> {
        let gateway = Self::default();
        gateway.fail.store(true, Ordering::SeqCst);
        Arc::new(gateway)
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionGateway for ScriptedGateway {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn complete(
        &self,
        title: &str,
        _transcript: &str,
    ) -> Result<CompletionResult, CompletionError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.titles.lock().unwrap().push(title.to_string());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail.load(Ordering::SeqCst) {
            return Err(CompletionError::Backend("scripted failure".to_string()));
        }

        Ok(CompletionResult {
            summary: format!("{} summary #{}", title, n),
            action_items: vec![ActionItem::new(format!("follow-up #{}", n))],
        })
    }
}

/// The first call parks until [`GatedGateway::release_first`] and then fails.
/// Every later call succeeds immediately.
#[derive(Default)]
pub struct GatedGateway {
    pub calls: AtomicUsize,
    gate: Notify,
}

impl GatedGateway {
    pub fn release_first(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl CompletionGateway for GatedGateway {
    fn name(&self) -> &'static str {
        "gated"
    }

    async fn complete(
        &self,
        title: &str,
        _transcript: &str,
    ) -> Result<CompletionResult, CompletionError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n == 1 {
            self.gate.notified().await;
            return Err(CompletionError::Backend("late failure".to_string()));
        }

        Ok(CompletionResult {
            summary: format!("{} summary #{}", title, n),
            action_items: Vec::new(),
        })
    }
}

pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    fn model(&self) -> &str {
        "broken-embedding"
    }

    async fn vectorize(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::Backend("embedding service unavailable".to_string()))
    }
}

/// Delegates to SQLite but rejects every embedding write.
pub struct EmbeddingWriteFailsStore {
    pub inner: Arc<SqliteMeetingStore>,
    pub embedding_writes: AtomicUsize,
}

impl EmbeddingWriteFailsStore {
    pub fn new(inner: Arc<SqliteMeetingStore>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            embedding_writes: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl MeetingStore for EmbeddingWriteFailsStore {
    async fn insert(&self, meeting: &Meeting) -> Result<Meeting, StoreError> {
        self.inner.insert(meeting).await
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Meeting>, StoreError> {
        self.inner.get_by_id(id).await
    }

    async fn update_result(
        &self,
        id: &str,
        update: &MeetingUpdate,
    ) -> Result<Option<Meeting>, StoreError> {
        self.inner.update_result(id, update).await
    }

    async fn mark_failed(&self, id: &str) -> Result<bool, StoreError> {
        self.inner.mark_failed(id).await
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<Meeting>, StoreError> {
        self.inner.list_recent(limit).await
    }

    async fn append_embedding(
        &self,
        _meeting_id: &str,
        _model: &str,
        _vector: &[f32],
    ) -> Result<(), StoreError> {
        self.embedding_writes.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Database("disk I/O error".to_string()))
    }
}

/// Holds every job until a permit is added, then hands it to the pipeline.
pub struct GatedHandler {
    pub gate: Arc<Semaphore>,
    pub pipeline: MeetingPipeline,
}

#[async_trait]
impl JobHandler for GatedHandler {
    async fn handle(&self, job: &Job) -> anyhow::Result<()> {
        self.gate.acquire().await?.forget();
        self.pipeline.handle(job).await
    }
}

pub fn memory_store() -> Arc<SqliteMeetingStore> {
    Arc::new(SqliteMeetingStore::open_in_memory().unwrap())
}

pub fn pipeline(
    store: &Arc<SqliteMeetingStore>,
    gateway: Arc<dyn CompletionGateway>,
    queue: Option<JobQueue>,
) -> MeetingPipeline {
    let embeddings = EmbeddingSideChannel::new(
        true,
        Arc::new(CharCodeEmbedder::default()),
        store.clone(),
    );
    MeetingPipeline::new(store.clone(), gateway, embeddings, queue)
}

/// A queued pipeline whose worker is already running.
pub fn started_pipeline(
    store: &Arc<SqliteMeetingStore>,
    gateway: Arc<dyn CompletionGateway>,
) -> (MeetingPipeline, JobQueue) {
    let queue = JobQueue::new();
    let pipeline = pipeline(store, gateway, Some(queue.clone()));
    queue.start(Arc::new(pipeline.clone()));
    (pipeline, queue)
}

pub async fn wait_until_drained(queue: &JobQueue) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while queue.stats().pending > 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("queue did not drain in time");
}

pub async fn wait_for_calls(calls: &AtomicUsize, expected: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while calls.load(Ordering::SeqCst) < expected {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("completion was not called in time");
}
