//! Best-effort transcript embeddings.
//!
//! Embeddings live in their own failure domain: [`EmbeddingSideChannel::embed_if_enabled`]
//! never returns an error, so a broken embedder or a failed write cannot change a
//! meeting's status or the caller's result.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::meeting::MeetingStore;

pub const MOCK_EMBEDDING_MODEL: &str = "mock-embedding";
pub const EMBEDDING_DIMS: usize = 128;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model identifier stored next to every vector.
    fn model(&self) -> &str;

    async fn vectorize(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Purely computed embedder: one dimension per character of the first
/// [`EMBEDDING_DIMS`] characters, `(codepoint % 97) / 97`, zero padded.
#[derive(Debug, Clone)]
pub struct CharCodeEmbedder {
    dims: usize,
}

impl Default for CharCodeEmbedder {
    fn default() -> Self {
        Self {
            dims: EMBEDDING_DIMS,
        }
    }
}

impl CharCodeEmbedder {
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector: Vec<f32> = text
            .chars()
            .take(self.dims)
            .map(|c| (c as u32 % 97) as f32 / 97.0)
            .collect();
        vector.resize(self.dims, 0.0);
        vector
    }
}

#[async_trait]
impl Embedder for CharCodeEmbedder {
    fn model(&self) -> &str {
        MOCK_EMBEDDING_MODEL
    }

    async fn vectorize(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self.embed(text))
    }
}

#[derive(Clone)]
pub struct EmbeddingSideChannel {
    enabled: bool,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn MeetingStore>,
}

impl EmbeddingSideChannel {
    pub fn new(enabled: bool, embedder: Arc<dyn Embedder>, store: Arc<dyn MeetingStore>) -> Self {
        Self {
            enabled,
            embedder,
            store,
        }
    }

    pub fn disabled(store: Arc<dyn MeetingStore>) -> Self {
        Self::new(false, Arc::new(CharCodeEmbedder::default()), store)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub async fn embed_if_enabled(&self, meeting_id: &str, text: &str) {
        if !self.enabled {
            return;
        }

        let vector = match self.embedder.vectorize(text).await {
            Ok(vector) => vector,
            Err(e) => {
                warn!("Embedding for meeting {} failed (non-fatal): {}", meeting_id, e);
                return;
            }
        };

        let model = self.embedder.model();
        match self.store.append_embedding(meeting_id, model, &vector).await {
            Ok(()) => debug!(
                "Embedding saved for meeting {} ({} dims, model {})",
                meeting_id,
                vector.len(),
                model
            ),
            Err(e) => warn!(
                "Saving embedding for meeting {} failed (non-fatal): {}",
                meeting_id, e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_is_fixed_length() {
        let embedder = CharCodeEmbedder::default();
        assert_eq!(embedder.embed("hi").len(), EMBEDDING_DIMS);
        assert_eq!(embedder.embed(&"x".repeat(1000)).len(), EMBEDDING_DIMS);
        assert_eq!(embedder.embed("").len(), EMBEDDING_DIMS);
    }

    #[test]
    fn test_vector_values() {
        let embedder = CharCodeEmbedder::default();
        let vector = embedder.embed("a");
        // 'a' = 97 → 0
        assert_eq!(vector[0], 0.0);
        let vector = embedder.embed("b");
        assert!((vector[0] - 1.0 / 97.0).abs() < f32::EPSILON);
        assert!(vector[1..].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_only_prefix_contributes() {
        let embedder = CharCodeEmbedder::default();
        let base = "y".repeat(EMBEDDING_DIMS);
        assert_eq!(
            embedder.embed(&format!("{}tail", base)),
            embedder.embed(&format!("{}other", base))
        );
    }

    #[test]
    fn test_values_in_unit_range() {
        let embedder = CharCodeEmbedder::default();
        let vector = embedder.embed("Zoë said: 会议 ✓ done!");
        assert!(vector.iter().all(|v| (0.0..1.0).contains(v)));
    }
}
