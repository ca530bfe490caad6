//! Wire shapes of the sessions REST API.
//!
//! Responses use snake_case session fields. Persisted messages are decoded
//! one by one so a single unreadable message does not hide the rest of the
//! history.

use chat_protocol::{ConversationEntry, RawEvent, SessionRecord, SessionSummary};
use serde::Deserialize;
use serde_json::Value;

/// `GET {rest}/sessions` response body.
#[derive(Debug, Deserialize)]
pub struct SessionListResponse {
    #[serde(default)]
    pub sessions: Vec<SessionSummary>,
}

/// `GET {rest}/sessions/{id}` response body.
#[derive(Debug, Deserialize)]
pub struct SessionResponse {
    pub session: SessionSummary,
    #[serde(default)]
    pub messages: Vec<Value>,
    #[serde(default)]
    pub events: Vec<RawEvent>,
}

impl SessionResponse {
    pub fn into_record(self) -> SessionRecord {
        let session_id = self.session.session_id.clone();
        let messages = self
            .messages
            .into_iter()
            .enumerate()
            .filter_map(|(index, message)| {
                match serde_json::from_value::<ConversationEntry>(message) {
                    Ok(entry) => Some(entry),
                    Err(error) => {
                        tracing::warn!(%session_id, index, %error, "skipping unreadable persisted message");
                        None
                    }
                }
            })
            .collect();

        SessionRecord {
            session: self.session,
            messages,
            events: self.events,
        }
    }
}
