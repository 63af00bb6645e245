//! REST API server for meetnotes.
//!
//! Provides HTTP endpoints for:
//! - Service info, version and health
//! - Meeting creation, listing and retrieval
//! - Forced re-summarization

pub mod error;
pub mod routes;

use crate::meeting::MeetingPipeline;
use anyhow::{Context, Result};
use axum::{extract::State, response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::future::Future;
use tower::ServiceBuilder;
use tracing::info;

pub struct ApiServer {
    addr: String,
    pipeline: MeetingPipeline,
}

/// Build the full application router.
pub fn router(pipeline: MeetingPipeline) -> Router {
    Router::new()
        // Root and version endpoints
        .route("/", get(status))
        .route("/version", get(version))
        .merge(
            Router::new()
                .route("/health", get(health))
                .with_state(pipeline.clone()),
        )
        .nest("/api/v1", routes::meetings::router(pipeline))
        .layer(ServiceBuilder::new())
}

impl ApiServer {
    pub fn new(addr: impl Into<String>, pipeline: MeetingPipeline) -> Self {
        Self {
            addr: addr.into(),
            pipeline,
        }
    }

    /// Serve until `shutdown` resolves. In-flight requests are allowed to finish.
    pub async fn start<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = router(self.pipeline);

        let listener = tokio::net::TcpListener::bind(&self.addr)
            .await
            .with_context(|| format!("Failed to bind {}", self.addr))?;

        info!("API server listening on http://{}", self.addr);
        info!("Endpoints:");
        info!("  GET  /                                   - Service info");
        info!("  GET  /version                            - Get version info");
        info!("  GET  /health                             - Pipeline health");
        info!("  POST /api/v1/meetings                    - Create meeting");
        info!("  GET  /api/v1/meetings                    - List meetings");
        info!("  GET  /api/v1/meetings/:id                - Get meeting (?auto=1)");
        info!("  POST /api/v1/meetings/:id/force-summarize - Recompute summary");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("API server stopped");
        Ok(())
    }
}

async fn status() -> Json<Value> {
    Json(json!({
        "service": "meetnotes",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn version() -> Json<Value> {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "name": "meetnotes"
    }))
}

async fn health(State(pipeline): State<MeetingPipeline>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "completion_provider": pipeline.completion_name(),
        "jobs_enabled": pipeline.jobs_enabled(),
        "embeddings_enabled": pipeline.embeddings_enabled(),
        "queue": pipeline.queue_stats(),
    }))
}
