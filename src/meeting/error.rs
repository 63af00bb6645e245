use thiserror::Error;

use super::store::StoreError;
use crate::completion::CompletionError;

/// Classification consumed by the HTTP layer to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Upstream,
    NotFound,
    Conflict,
    Internal,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("meeting {0} not found")]
    MeetingNotFound(String),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Completion(e) if e.is_configuration() => ErrorKind::Configuration,
            Self::Completion(_) => ErrorKind::Upstream,
            Self::Store(StoreError::Conflict(_)) => ErrorKind::Conflict,
            Self::Store(_) => ErrorKind::Internal,
            Self::MeetingNotFound(_) => ErrorKind::NotFound,
        }
    }
}
