use chat_protocol::{ConversationEntry, RawEvent};
use serde::{Deserialize, Serialize};

/// First line of every session file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionHeader {
    pub version: u32,
    pub session_id: String,
    pub created_at: String,
    pub updated_at: String,
}

impl SessionHeader {
    #[must_use]
    pub fn v1(
        session_id: impl Into<String>,
        created_at: impl Into<String>,
        updated_at: impl Into<String>,
    ) -> Self {
        Self {
            version: 1,
            session_id: session_id.into(),
            created_at: created_at.into(),
            updated_at: updated_at.into(),
        }
    }
}

/// One persisted timeline entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessageRecord {
    pub ts: String,
    pub entry: ConversationEntry,
}

/// One raw protocol event captured while the conversation streamed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventRecord {
    pub ts: String,
    pub event: RawEvent,
}

/// A single line of a session file, tagged by its `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ArchiveLine {
    Session(SessionHeader),
    Message(MessageRecord),
    Event(EventRecord),
}
