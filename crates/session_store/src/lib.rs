//! Read-only archive of conversations persisted as JSONL files.
//!
//! Each file holds one session: a header line followed by message and event
//! records. [`SessionArchive`] lists and loads them and implements
//! [`chat_protocol::SessionSource`] so restored history can come from disk
//! instead of the agent server.

mod archive;
mod error;
mod paths;
mod schema;
mod store;

pub use archive::SessionArchive;
pub use error::SessionStoreError;
pub use paths::{session_file_name, session_root, SESSION_FILE_EXTENSION};
pub use schema::{ArchiveLine, EventRecord, MessageRecord, SessionHeader};
pub use store::SessionFile;
