//! SQLite persistence for meetings and their embeddings.
//!
//! Raw SQL with rusqlite, no ORM. [`SqliteMeetingStore`] adapts the synchronous
//! repository to the async [`MeetingStore`](crate::meeting::MeetingStore) contract.

pub mod init;
pub mod meetings;
mod store;

pub use init::{init_db, migrate};
pub use meetings::MeetingRepository;
pub use store::SqliteMeetingStore;

use rusqlite::ffi;

use crate::meeting::StoreError;

/// Unique and primary-key violations become [`StoreError::Conflict`]; every other
/// failure, including foreign-key violations, is a plain database error.
impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, message)
                if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                StoreError::Conflict(message.clone().unwrap_or_else(|| err.to_string()))
            }
            _ => StoreError::Database(err.to_string()),
        }
    }
}
