//! Completion gateway: turns a transcript into a summary and action items.
//!
//! Two strategies sit behind [`CompletionGateway`]:
//! - [`StubGateway`]: deterministic, offline, used for tests and the `mock` provider.
//! - [`LlmGateway`]: builds a prompt, sends it to a [`CompletionBackend`] and parses
//!   the JSON object out of whatever text comes back.

mod api;
mod parse;
mod prompt;
mod stub;

pub use api::{ChatCompletionsBackend, CompletionBackend, LlmGateway};
pub use parse::parse_completion;
pub use prompt::build_summary_prompt;
pub use stub::StubGateway;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::CompletionConfig;
use crate::meeting::ActionItem;

pub const GROQ_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const GROQ_DEFAULT_MODEL: &str = "llama-3.1-8b-instant";
pub const OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";

pub const SUPPORTED_PROVIDERS: &[&str] = &["mock", "groq", "openai"];

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("unsupported completion provider '{0}' (supported: mock, groq, openai)")]
    UnsupportedBackend(String),

    #[error("missing credential: {0}")]
    MissingCredential(String),

    #[error("malformed completion response: {0}")]
    MalformedResponse(String),

    #[error("completion backend error: {0}")]
    Backend(String),
}

impl CompletionError {
    /// Configuration problems are fatal at startup; everything else is a
    /// per-attempt failure.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedBackend(_) | Self::MissingCredential(_)
        )
    }
}

/// Structured output of a completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionResult {
    pub summary: String,
    #[serde(default)]
    pub action_items: Vec<ActionItem>,
}

#[async_trait]
pub trait CompletionGateway: Send + Sync {
    fn name(&self) -> &'static str;

    async fn complete(
        &self,
        title: &str,
        transcript: &str,
    ) -> Result<CompletionResult, CompletionError>;
}

/// Build the gateway named by the config. Unknown providers and live providers
/// without an API key are rejected here so the service fails at startup.
pub fn build_gateway(config: &CompletionConfig) -> Result<Arc<dyn CompletionGateway>, CompletionError> {
    let provider = config.provider.trim().to_lowercase();

    let gateway: Arc<dyn CompletionGateway> = match provider.as_str() {
        "mock" => Arc::new(StubGateway),
        "groq" | "openai" => {
            let api_key = config
                .api_key
                .clone()
                .filter(|key| !key.trim().is_empty())
                .ok_or_else(|| {
                    CompletionError::MissingCredential(format!(
                        "api_key is required for the {} provider",
                        provider
                    ))
                })?;

            let (default_endpoint, default_model) = if provider == "groq" {
                (GROQ_ENDPOINT, GROQ_DEFAULT_MODEL)
            } else {
                (OPENAI_ENDPOINT, OPENAI_DEFAULT_MODEL)
            };

            let backend = ChatCompletionsBackend::new(
                config
                    .api_endpoint
                    .clone()
                    .unwrap_or_else(|| default_endpoint.to_string()),
                config
                    .model
                    .clone()
                    .unwrap_or_else(|| default_model.to_string()),
                api_key,
                config.temperature,
                Duration::from_secs(config.timeout_seconds),
            )?;
            Arc::new(LlmGateway::new(backend))
        }
        _ => return Err(CompletionError::UnsupportedBackend(config.provider.clone())),
    };

    info!("Using {} for completions", gateway.name());
    Ok(gateway)
}
