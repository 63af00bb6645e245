//! Meeting records and the processing pipeline.
//!
//! A meeting is created with its transcript, summarized by the completion
//! gateway (queued or inline) and moves `processing` → `ready` / `failed`.

pub mod error;
pub mod pipeline;
pub mod record;
pub mod status;
pub mod store;

pub use error::{ErrorKind, PipelineError};
pub use pipeline::{CreateOutcome, MeetingPipeline, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
pub use record::{ActionItem, Meeting, MeetingUpdate};
pub use status::MeetingStatus;
pub use store::{MeetingStore, StoreError};
