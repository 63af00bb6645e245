//! Record store contract consumed by the pipeline.
//!
//! The store exclusively owns persisted meeting state. Implementations must accept
//! ids generated by the caller and report unique-field violations as
//! [`StoreError::Conflict`].

use async_trait::async_trait;
use thiserror::Error;

use super::record::{Meeting, MeetingUpdate};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("conflict on unique field: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("corrupt record {id}: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("store task failed: {0}")]
    Task(String),
}

#[async_trait]
pub trait MeetingStore: Send + Sync {
    async fn insert(&self, meeting: &Meeting) -> Result<Meeting, StoreError>;

    async fn get_by_id(&self, id: &str) -> Result<Option<Meeting>, StoreError>;

    /// Write summary, action items and status in one statement.
    /// Returns `None` if the record no longer exists.
    async fn update_result(
        &self,
        id: &str,
        update: &MeetingUpdate,
    ) -> Result<Option<Meeting>, StoreError>;

    /// Move a record to `failed` unless it is already settled (`ready` with a
    /// summary). Returns whether a row changed.
    async fn mark_failed(&self, id: &str) -> Result<bool, StoreError>;

    /// Newest first.
    async fn list_recent(&self, limit: usize) -> Result<Vec<Meeting>, StoreError>;

    async fn append_embedding(
        &self,
        meeting_id: &str,
        model: &str,
        vector: &[f32],
    ) -> Result<(), StoreError>;
}
