use serde::{Deserialize, Serialize};

use crate::entry::ConversationEntry;
use crate::RawEvent;

/// Listing row for one persisted conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Everything needed to restore one conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session: SessionSummary,
    #[serde(default)]
    pub messages: Vec<ConversationEntry>,
    #[serde(default)]
    pub events: Vec<RawEvent>,
}
