#![allow(dead_code)]

use buddy_chat::{ConversationEntry, EntryRole};
use chat_protocol::{SessionRecord, SessionSummary};

pub fn roles(entries: &[ConversationEntry]) -> Vec<EntryRole> {
    entries.iter().map(|entry| entry.role).collect()
}

pub fn contents(entries: &[ConversationEntry]) -> Vec<&str> {
    entries.iter().map(|entry| entry.content.as_str()).collect()
}

pub fn assert_all_closed(entries: &[ConversationEntry]) {
    for entry in entries {
        assert!(!entry.streaming, "entry still streaming: {entry:?}");
    }
}

pub fn session_record(
    session_id: &str,
    updated_at: &str,
    messages: Vec<ConversationEntry>,
    events: Vec<serde_json::Value>,
) -> SessionRecord {
    SessionRecord {
        session: SessionSummary {
            session_id: session_id.to_string(),
            created_at: "2026-03-01T08:00:00Z".to_string(),
            updated_at: updated_at.to_string(),
        },
        messages,
        events,
    }
}
