//! Meeting record types shared by the pipeline, the store and the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::{self, MeetingStatus};
use crate::completion::CompletionResult;

/// A single follow-up extracted from a meeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,
}

impl ActionItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            owner: None,
            due: None,
        }
    }
}

/// A persisted meeting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    pub id: String,
    pub title: String,
    pub transcript: String,
    pub summary: Option<String>,
    pub action_items: Option<Vec<ActionItem>>,
    pub status: MeetingStatus,
    pub created_at: DateTime<Utc>,
}

impl Meeting {
    /// Build a fresh record with a core-generated id and no result yet.
    pub fn new(title: impl Into<String>, transcript: impl Into<String>, status: MeetingStatus) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            transcript: transcript.into(),
            summary: None,
            action_items: None,
            status,
            created_at: Utc::now(),
        }
    }

    /// `ready` with a summary: queued jobs skip it and failures leave it alone.
    pub fn is_settled(&self) -> bool {
        status::is_settled(self.status, self.summary.as_deref())
    }

    /// Still waiting on a result, so a read with auto-complete should compute one.
    pub fn needs_completion(&self) -> bool {
        self.status == MeetingStatus::Processing || self.summary.is_none()
    }
}

/// The fields written together when a completion lands.
#[derive(Debug, Clone, PartialEq)]
pub struct MeetingUpdate {
    pub summary: Option<String>,
    pub action_items: Option<Vec<ActionItem>>,
    pub status: MeetingStatus,
}

impl MeetingUpdate {
    pub fn ready(result: CompletionResult) -> Self {
        Self {
            summary: Some(result.summary),
            action_items: Some(result.action_items),
            status: MeetingStatus::Ready,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_meeting_has_no_result() {
        let meeting = Meeting::new("Standup", "We talked.", MeetingStatus::Processing);
        assert!(uuid::Uuid::parse_str(&meeting.id).is_ok());
        assert!(meeting.summary.is_none());
        assert!(meeting.action_items.is_none());
        assert!(meeting.needs_completion());
        assert!(!meeting.is_settled());
    }

    #[test]
    fn test_failed_without_summary_needs_completion() {
        let meeting = Meeting::new("Retro", "Notes.", MeetingStatus::Failed);
        assert!(meeting.needs_completion());
    }

    #[test]
    fn test_ready_with_summary_is_settled() {
        let mut meeting = Meeting::new("Retro", "Notes.", MeetingStatus::Ready);
        meeting.summary = Some("Went well".to_string());
        assert!(meeting.is_settled());
        assert!(!meeting.needs_completion());
    }

    #[test]
    fn test_action_item_serialization_skips_missing_fields() {
        let item = ActionItem::new("Share notes");
        let json = serde_json::to_string(&item).unwrap();
        assert_eq!(json, r#"{"text":"Share notes"}"#);

        let parsed: ActionItem =
            serde_json::from_str(r#"{"text":"Ship it","owner":"Ana","due":"2025-03-01"}"#).unwrap();
        assert_eq!(parsed.owner.as_deref(), Some("Ana"));
        assert_eq!(parsed.due.as_deref(), Some("2025-03-01"));
    }

    #[test]
    fn test_meeting_json_shape() {
        let meeting = Meeting::new("Sync", "Hello there.", MeetingStatus::Processing);
        let value = serde_json::to_value(&meeting).unwrap();
        assert_eq!(value["status"], "processing");
        assert!(value["summary"].is_null());
        assert!(value["action_items"].is_null());
        assert!(value["created_at"].is_string());
    }

    #[test]
    fn test_update_ready_from_result() {
        let update = MeetingUpdate::ready(CompletionResult {
            summary: "Summary".to_string(),
            action_items: vec![ActionItem::new("Follow up")],
        });
        assert_eq!(update.status, MeetingStatus::Ready);
        assert_eq!(update.summary.as_deref(), Some("Summary"));
        assert_eq!(update.action_items.unwrap().len(), 1);
    }
}
