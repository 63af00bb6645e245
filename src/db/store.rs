use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

use super::init::{init_db, migrate};
use super::meetings::MeetingRepository;
use crate::meeting::{Meeting, MeetingStore, MeetingUpdate, StoreError};

/// [`MeetingStore`] over a single SQLite connection.
///
/// Every call runs on the blocking pool; the connection sits behind a mutex so
/// statements from concurrent callers are serialized.
#[derive(Clone)]
pub struct SqliteMeetingStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteMeetingStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = init_db(path)?;
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        migrate(&conn)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| StoreError::Task("database connection lock poisoned".to_string()))?;
            f(&guard)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }

    /// Number of embedding rows stored for a meeting.
    pub async fn embedding_count(&self, meeting_id: &str) -> Result<i64, StoreError> {
        let meeting_id = meeting_id.to_string();
        self.with_conn(move |conn| MeetingRepository::count_embeddings(conn, &meeting_id))
            .await
    }
}

#[async_trait]
impl MeetingStore for SqliteMeetingStore {
    async fn insert(&self, meeting: &Meeting) -> Result<Meeting, StoreError> {
        let meeting = meeting.clone();
        self.with_conn(move |conn| {
            MeetingRepository::insert(conn, &meeting)?;
            Ok(meeting)
        })
        .await
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Meeting>, StoreError> {
        let id = id.to_string();
        self.with_conn(move |conn| MeetingRepository::get(conn, &id))
            .await
    }

    async fn update_result(
        &self,
        id: &str,
        update: &MeetingUpdate,
    ) -> Result<Option<Meeting>, StoreError> {
        let id = id.to_string();
        let update = update.clone();
        self.with_conn(move |conn| {
            if !MeetingRepository::update_result(conn, &id, &update)? {
                return Ok(None);
            }
            MeetingRepository::get(conn, &id)
        })
        .await
    }

    async fn mark_failed(&self, id: &str) -> Result<bool, StoreError> {
        let id = id.to_string();
        self.with_conn(move |conn| MeetingRepository::mark_failed(conn, &id))
            .await
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<Meeting>, StoreError> {
        self.with_conn(move |conn| MeetingRepository::list(conn, limit))
            .await
    }

    async fn append_embedding(
        &self,
        meeting_id: &str,
        model: &str,
        vector: &[f32],
    ) -> Result<(), StoreError> {
        let meeting_id = meeting_id.to_string();
        let model = model.to_string();
        let vector = vector.to_vec();
        self.with_conn(move |conn| {
            MeetingRepository::append_embedding(conn, &meeting_id, &model, &vector)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meeting::MeetingStatus;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_round_trip_through_store() {
        let store = SqliteMeetingStore::open_in_memory().unwrap();
        let meeting = Meeting::new("Kickoff", "We met and planned.", MeetingStatus::Processing);

        let inserted = store.insert(&meeting).await.unwrap();
        assert_eq!(inserted.id, meeting.id);

        let update = MeetingUpdate {
            summary: Some("Planned.".to_string()),
            action_items: Some(Vec::new()),
            status: MeetingStatus::Ready,
        };
        let updated = store.update_result(&meeting.id, &update).await.unwrap().unwrap();
        assert_eq!(updated.status, MeetingStatus::Ready);
        assert_eq!(updated.summary.as_deref(), Some("Planned."));

        assert!(store.update_result("missing", &update).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_embeddings_are_appended() {
        let store = SqliteMeetingStore::open_in_memory().unwrap();
        let meeting = Meeting::new("Sync", "Short sync call.", MeetingStatus::Processing);
        store.insert(&meeting).await.unwrap();

        store
            .append_embedding(&meeting.id, "mock-embedding", &[0.5; 4])
            .await
            .unwrap();
        assert_eq!(store.embedding_count(&meeting.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_file_backed_store_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("meetnotes.db");

        let meeting = Meeting::new("Persisted", "Kept across opens.", MeetingStatus::Processing);
        {
            let store = SqliteMeetingStore::open(&path).unwrap();
            store.insert(&meeting).await.unwrap();
        }

        let reopened = SqliteMeetingStore::open(&path).unwrap();
        let fetched = reopened.get_by_id(&meeting.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Persisted");
        assert_eq!(reopened.list_recent(10).await.unwrap().len(), 1);
    }
}
