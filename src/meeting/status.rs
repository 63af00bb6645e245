//! Meeting status lifecycle.
//!
//! ```text
//! processing ──completion ok──▶ ready ◀──force recompute── ready
//!      │                          ▲
//!      └──completion failed──▶ failed ──later success──┘
//! ```
//!
//! A `ready` record with a summary is "settled": queued jobs skip it and a failed
//! attempt never downgrades it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Processing status of a meeting record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetingStatus {
    Processing,
    Ready,
    Failed,
}

impl MeetingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for MeetingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown meeting status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for MeetingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(Self::Processing),
            "ready" => Ok(Self::Ready),
            "failed" => Ok(Self::Failed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Returns true when a record holds a successful result that must not be redone
/// by a queued job or overwritten by a failure.
pub fn is_settled(status: MeetingStatus, summary: Option<&str>) -> bool {
    status == MeetingStatus::Ready && summary.is_some()
}
