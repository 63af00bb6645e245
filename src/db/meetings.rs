//! Meeting record persistence.
//!
//! CRUD for the `meetings` table plus appends to `meeting_embeddings`.
//! Raw SQL with rusqlite, no ORM.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::meeting::{ActionItem, Meeting, MeetingStatus, MeetingUpdate, StoreError};

const MEETING_COLUMNS: &str = "id, title, transcript, summary, action_items, status, created_at";

/// Column values as stored, before decoding status, JSON and timestamps.
struct MeetingRow {
    id: String,
    title: String,
    transcript: String,
    summary: Option<String>,
    action_items: Option<String>,
    status: String,
    created_at: String,
}

impl MeetingRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            transcript: row.get(2)?,
            summary: row.get(3)?,
            action_items: row.get(4)?,
            status: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn into_meeting(self) -> Result<Meeting, StoreError> {
        let corrupt = |reason: String| StoreError::Corrupt {
            id: self.id.clone(),
            reason,
        };

        let status: MeetingStatus = self.status.parse().map_err(|e| corrupt(format!("{}", e)))?;
        let action_items = self
            .action_items
            .as_deref()
            .map(serde_json::from_str::<Vec<ActionItem>>)
            .transpose()
            .map_err(|e| corrupt(format!("bad action_items: {}", e)))?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| corrupt(format!("bad created_at: {}", e)))?
            .with_timezone(&Utc);

        Ok(Meeting {
            id: self.id,
            title: self.title,
            transcript: self.transcript,
            summary: self.summary,
            action_items,
            status,
            created_at,
        })
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn encode_action_items(items: Option<&Vec<ActionItem>>) -> Result<Option<String>, StoreError> {
    items
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| StoreError::Database(format!("failed to encode action items: {}", e)))
}

/// Repository for meeting records.
pub struct MeetingRepository;

impl MeetingRepository {
    /// Insert a record exactly as given, including its id and timestamp.
    pub fn insert(conn: &Connection, meeting: &Meeting) -> Result<(), StoreError> {
        conn.execute(
            &format!(
                "INSERT INTO meetings ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                MEETING_COLUMNS
            ),
            params![
                meeting.id,
                meeting.title,
                meeting.transcript,
                meeting.summary,
                encode_action_items(meeting.action_items.as_ref())?,
                meeting.status.as_str(),
                format_timestamp(&meeting.created_at),
            ],
        )?;
        Ok(())
    }

    /// Get a meeting by ID.
    pub fn get(conn: &Connection, id: &str) -> Result<Option<Meeting>, StoreError> {
        let row = conn
            .query_row(
                &format!("SELECT {} FROM meetings WHERE id = ?1", MEETING_COLUMNS),
                params![id],
                MeetingRow::read,
            )
            .optional()?;

        row.map(MeetingRow::into_meeting).transpose()
    }

    /// Write summary, action items and status together. Returns whether the
    /// record existed.
    pub fn update_result(
        conn: &Connection,
        id: &str,
        update: &MeetingUpdate,
    ) -> Result<bool, StoreError> {
        let changed = conn.execute(
            "UPDATE meetings SET summary = ?1, action_items = ?2, status = ?3 WHERE id = ?4",
            params![
                update.summary,
                encode_action_items(update.action_items.as_ref())?,
                update.status.as_str(),
                id,
            ],
        )?;
        Ok(changed > 0)
    }

    /// Mark failed unless the record is `ready` with a summary.
    pub fn mark_failed(conn: &Connection, id: &str) -> Result<bool, StoreError> {
        let changed = conn.execute(
            "UPDATE meetings SET status = ?1 \
             WHERE id = ?2 AND NOT (status = ?3 AND summary IS NOT NULL)",
            params![
                MeetingStatus::Failed.as_str(),
                id,
                MeetingStatus::Ready.as_str(),
            ],
        )?;
        Ok(changed > 0)
    }

    /// List meetings, newest first.
    pub fn list(conn: &Connection, limit: usize) -> Result<Vec<Meeting>, StoreError> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM meetings ORDER BY created_at DESC, rowid DESC LIMIT ?1",
            MEETING_COLUMNS
        ))?;

        let rows = stmt.query_map(params![limit as i64], MeetingRow::read)?;

        let mut meetings = Vec::new();
        for row in rows {
            meetings.push(row?.into_meeting()?);
        }

        Ok(meetings)
    }

    pub fn append_embedding(
        conn: &Connection,
        meeting_id: &str,
        model: &str,
        vector: &[f32],
    ) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(vector)
            .map_err(|e| StoreError::Database(format!("failed to encode embedding: {}", e)))?;

        conn.execute(
            "INSERT INTO meeting_embeddings (meeting_id, model, embedding, created_at) \
             VALUES (?1, ?2, ?3, ?4)",
            params![meeting_id, model, encoded, format_timestamp(&Utc::now())],
        )?;
        Ok(())
    }

    pub fn count_embeddings(conn: &Connection, meeting_id: &str) -> Result<i64, StoreError> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM meeting_embeddings WHERE meeting_id = ?1",
            params![meeting_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
