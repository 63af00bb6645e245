use crate::api::ApiServer;
use crate::completion::build_gateway;
use crate::config::Config;
use crate::db::SqliteMeetingStore;
use crate::embedding::{CharCodeEmbedder, EmbeddingSideChannel};
use crate::jobs::JobQueue;
use crate::meeting::{MeetingPipeline, MeetingStore};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info, warn};

pub async fn run_service() -> Result<()> {
    info!("Starting meetnotes service");

    let config = Config::load()?;
    let store = open_store(&config)?;
    let (pipeline, queue) = build_pipeline(&config, store, config.pipeline.enable_jobs)?;

    if let Some(queue) = &queue {
        queue.start(Arc::new(pipeline.clone()));
    } else {
        info!("Background jobs disabled, meetings are summarized on create");
    }

    let shutdown_queue = queue.clone();
    let server = ApiServer::new(config.bind_address(), pipeline);

    info!("meetnotes is ready!");
    info!(
        "Try: curl -X POST http://{}/api/v1/meetings -H 'Content-Type: application/json' \
         -d '{{\"title\":\"Standup\",\"transcript\":\"We shipped the release. Next up is docs.\"}}'",
        config.bind_address()
    );

    server
        .start(async move {
            shutdown_signal().await;
            info!("Shutdown requested");
            if let Some(queue) = shutdown_queue {
                queue.shutdown();
            }
        })
        .await?;

    if let Some(queue) = queue {
        let pending = queue.stats().pending;
        if pending > 0 {
            warn!("Exiting with {} queued meeting job(s) not processed", pending);
        }
    }

    Ok(())
}

pub fn open_store(config: &Config) -> Result<Arc<dyn MeetingStore>> {
    let db_path = config.db_path()?;
    let store = SqliteMeetingStore::open(&db_path)
        .with_context(|| format!("Failed to open database at {:?}", db_path))?;
    info!("Using database at {:?}", db_path);
    Ok(Arc::new(store))
}

/// Wire the pipeline from config. The returned queue is not started yet.
///
/// Fails when the completion provider is unknown or lacks a credential.
pub fn build_pipeline(
    config: &Config,
    store: Arc<dyn MeetingStore>,
    enable_jobs: bool,
) -> Result<(MeetingPipeline, Option<JobQueue>)> {
    let completion =
        build_gateway(&config.completion).context("Invalid completion configuration")?;

    let embeddings = EmbeddingSideChannel::new(
        config.pipeline.enable_embeddings,
        Arc::new(CharCodeEmbedder::default()),
        store.clone(),
    );

    let queue = enable_jobs.then(JobQueue::new);
    let pipeline = MeetingPipeline::new(store, completion, embeddings, queue.clone());

    Ok((pipeline, queue))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
