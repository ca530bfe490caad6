//! Rebuilds a conversation from persisted history.
//!
//! Persisted entries are authoritative. Persisted raw events are replayed
//! through the same reducer used live into a scratch timeline, and only the
//! replayed entries that have no persisted counterpart are kept.

use std::collections::{HashMap, HashSet};

use chat_protocol::{ConversationEntry, EntryRole, SessionRecord, SessionSource, SessionSummary};

use crate::accumulator::StreamingAccumulator;
use crate::classifier::{classify, ClassifiedEvent, MessageRole, StatusSource};
use crate::session::{ChatSession, ConversationIds};
use crate::timeline::Timeline;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreSummary {
    /// Entries taken from the persisted history.
    pub persisted: usize,
    /// Entries produced by replaying persisted events.
    pub replayed: usize,
    /// Replayed entries appended after deduplication.
    pub appended: usize,
}

pub(crate) struct Restored {
    pub(crate) entries: Vec<ConversationEntry>,
    pub(crate) ids: ConversationIds,
    /// State of the last replayed `status-update`, if any.
    pub(crate) status_text: Option<String>,
    pub(crate) summary: RestoreSummary,
}

/// Entry identity used to match replayed entries against persisted ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum MatchKey {
    ToolCall(String),
    Content(EntryRole, String),
}

impl MatchKey {
    fn of(entry: &ConversationEntry) -> Self {
        match (&entry.role, &entry.tool_call_id) {
            (EntryRole::ToolCall, Some(tool_call_id)) => Self::ToolCall(tool_call_id.clone()),
            _ => Self::Content(entry.role, entry.content.clone()),
        }
    }
}

pub(crate) fn rebuild(record: &SessionRecord) -> Restored {
    let persisted: Vec<ConversationEntry> = record
        .messages
        .iter()
        .cloned()
        .map(|entry| entry.streaming(false))
        .collect();

    let represented: HashSet<String> = persisted
        .iter()
        .filter(|entry| entry.is_tool_call())
        .filter_map(|entry| entry.tool_call_id.clone())
        .collect();

    let mut ids = ConversationIds {
        context_id: Some(record.session.session_id.clone()),
        task_id: None,
    };
    let mut status_text = None;
    let mut scratch = Timeline::new();
    let mut accumulator = StreamingAccumulator::for_replay(represented);
    for raw in &record.events {
        let Some(event) = classify(raw) else {
            tracing::trace!("skipping unrecognized persisted event");
            continue;
        };

        // A user echo opens the next turn, as `begin_turn` does live.
        if let ClassifiedEvent::Message(message) = &event {
            if message.role == MessageRole::User {
                accumulator.close_turn(&mut scratch);
            }
        }

        ids.observe(&event);
        accumulator.apply(&event, &mut scratch);

        if let ClassifiedEvent::Status(status) = &event {
            if status.source == StatusSource::StatusUpdate {
                status_text = Some(status.state.clone());
            }
            if status.is_terminal() {
                accumulator.close_turn(&mut scratch);
            }
        }
    }
    // A replay ends like a stream but never synthesizes an empty answer.
    accumulator.close_open_entries(&mut scratch);

    let replayed = scratch.into_entries();
    let replayed_len = replayed.len();
    let remainder = reconcile(&persisted, replayed);

    let summary = RestoreSummary {
        persisted: persisted.len(),
        replayed: replayed_len,
        appended: remainder.len(),
    };
    let mut entries = persisted;
    entries.extend(remainder);

    Restored {
        entries,
        ids,
        status_text,
        summary,
    }
}

/// Returns the replayed entries not already represented in `persisted`, in
/// replay order.
///
/// Each persisted entry absorbs at most one replayed entry with the same role
/// and content; tool-call entries match on their tool call id instead.
#[must_use]
pub fn reconcile(
    persisted: &[ConversationEntry],
    replayed: Vec<ConversationEntry>,
) -> Vec<ConversationEntry> {
    let mut unmatched: HashMap<MatchKey, usize> = HashMap::new();
    for entry in persisted {
        *unmatched.entry(MatchKey::of(entry)).or_default() += 1;
    }

    replayed
        .into_iter()
        .filter(|entry| match unmatched.get_mut(&MatchKey::of(entry)) {
            Some(count) if *count > 0 => {
                *count -= 1;
                false
            }
            _ => true,
        })
        .collect()
}

/// Session history list with selection state and its own error line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionPicker {
    sessions: Vec<SessionSummary>,
    selected: usize,
    visible: bool,
    error: Option<String>,
}

impl SessionPicker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sessions(&self) -> &[SessionSummary] {
        &self.sessions
    }

    #[must_use]
    pub fn selected_index(&self) -> usize {
        self.selected
    }

    #[must_use]
    pub fn selected(&self) -> Option<&SessionSummary> {
        self.sessions.get(self.selected)
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Shows the picker with the first session selected.
    pub fn open(&mut self) {
        self.selected = 0;
        self.visible = true;
    }

    pub fn close(&mut self) {
        self.visible = false;
    }

    /// Moves the selection by `delta`, clamped to the list.
    pub fn move_selection(&mut self, delta: isize) {
        let Some(last) = self.sessions.len().checked_sub(1) else {
            self.selected = 0;
            return;
        };
        self.selected = self.selected.saturating_add_signed(delta).min(last);
    }

    /// Fetches the most recent sessions. On failure the list is kept and the
    /// error line is set.
    pub async fn load_sessions<S: SessionSource>(&mut self, source: &S, limit: usize) -> bool {
        match source.list_sessions(limit).await {
            Ok(sessions) => {
                self.sessions = sessions;
                self.selected = self.selected.min(self.sessions.len().saturating_sub(1));
                self.error = None;
                true
            }
            Err(error) => {
                tracing::warn!(error = %error, "failed to load sessions");
                self.error = Some(format!("Failed to load sessions: {error}"));
                false
            }
        }
    }

    /// Fetches `session_id` and restores it into `session`.
    ///
    /// On failure `session` is left untouched and the error line is set.
    pub async fn restore_into<S: SessionSource>(
        &mut self,
        source: &S,
        session_id: &str,
        session: &mut ChatSession,
    ) -> Option<RestoreSummary> {
        match source.fetch_session(session_id).await {
            Ok(record) => {
                let summary = session.restore(&record);
                self.error = None;
                self.visible = false;
                Some(summary)
            }
            Err(error) => {
                tracing::warn!(session_id, error = %error, "failed to restore session");
                self.error = Some(format!("Failed to restore session: {error}"));
                None
            }
        }
    }

    /// Restores the currently selected session, if any.
    pub async fn restore_selected<S: SessionSource>(
        &mut self,
        source: &S,
        session: &mut ChatSession,
    ) -> Option<RestoreSummary> {
        let session_id = self.selected()?.session_id.clone();
        self.restore_into(source, &session_id, session).await
    }
}

#[cfg(test)]
mod tests {
    use chat_protocol::ToolStatus;
    use chat_protocol_mock::events;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn summary(session_id: &str) -> SessionSummary {
        SessionSummary {
            session_id: session_id.to_string(),
            created_at: "2026-02-01T09:00:00Z".to_string(),
            updated_at: "2026-02-01T09:30:00Z".to_string(),
        }
    }

    fn entry(id: &str, role: EntryRole, content: &str) -> ConversationEntry {
        ConversationEntry::new(id, role, content, "09:00")
    }

    fn tool_call(id: &str, tool_call_id: &str) -> ConversationEntry {
        let mut entry = entry(id, EntryRole::ToolCall, "result").with_tool("bash", ToolStatus::Success);
        entry.tool_call_id = Some(tool_call_id.to_string());
        entry
    }

    #[test]
    fn reconcile_drops_one_replayed_entry_per_persisted_match() {
        let persisted = vec![entry("p1", EntryRole::Assistant, "same")];
        let replayed = vec![
            entry("r1", EntryRole::Assistant, "same"),
            entry("r2", EntryRole::Assistant, "same"),
            entry("r3", EntryRole::Thinking, "same"),
        ];

        let remainder = reconcile(&persisted, replayed);

        let ids: Vec<_> = remainder.iter().map(|entry| entry.id.as_str()).collect();
        assert_eq!(ids, vec!["r2", "r3"]);
    }

    #[test]
    fn reconcile_matches_tool_calls_by_call_id() {
        let persisted = vec![tool_call("p1", "call-1")];
        let mut renamed = tool_call("r1", "call-1");
        renamed.content = "different rendering".to_string();

        let remainder = reconcile(&persisted, vec![renamed, tool_call("r2", "call-2")]);

        assert_eq!(remainder.len(), 1);
        assert_eq!(remainder[0].tool_call_id.as_deref(), Some("call-2"));
    }

    #[test]
    fn rebuild_appends_trailing_status_after_persisted_entries() {
        let record = SessionRecord {
            session: summary("sess-7"),
            messages: vec![
                entry("a", EntryRole::Human, "hi"),
                entry("b", EntryRole::Assistant, "hello"),
            ],
            events: vec![
                events::output_end("hello"),
                events::status_update("working", false, Some("Indexing files")),
            ],
        };

        let restored = rebuild(&record);

        let contents: Vec<_> = restored
            .entries
            .iter()
            .map(|entry| (entry.role, entry.content.as_str()))
            .collect();
        assert_eq!(
            contents,
            vec![
                (EntryRole::Human, "hi"),
                (EntryRole::Assistant, "hello"),
                (EntryRole::Status, "Indexing files"),
            ]
        );
        assert_eq!(
            restored.summary,
            RestoreSummary {
                persisted: 2,
                replayed: 2,
                appended: 1,
            }
        );
        assert_eq!(restored.ids.context_id.as_deref(), Some("ctx-1"));
        assert_eq!(restored.ids.task_id.as_deref(), Some("task-1"));
    }

    #[test]
    fn rebuild_never_correlates_persisted_tool_calls_again() {
        let record = SessionRecord {
            session: summary("sess-1"),
            messages: vec![tool_call("p1", "call-1")],
            events: vec![
                events::tool_result(json!({ "toolName": "bash", "toolCallId": "call-1", "result": "x" })),
                events::tool_result(json!({ "toolName": "bash", "toolCallId": "call-2", "result": "y" })),
            ],
        };

        let restored = rebuild(&record);

        let call_ids: Vec<_> = restored
            .entries
            .iter()
            .filter_map(|entry| entry.tool_call_id.as_deref())
            .collect();
        assert_eq!(call_ids, vec!["call-1", "call-2"]);
        assert_eq!(restored.summary.replayed, 1);
    }

    #[test]
    fn rebuild_closes_replayed_streams_without_empty_answer() {
        let record = SessionRecord {
            session: summary("sess-2"),
            messages: Vec::new(),
            events: vec![events::thinking_start("reasoning"), json!({ "kind": "unknown" })],
        };

        let restored = rebuild(&record);

        assert_eq!(restored.entries.len(), 1);
        assert_eq!(restored.entries[0].role, EntryRole::Thinking);
        assert!(!restored.entries[0].streaming);
        assert_eq!(restored.ids.context_id.as_deref(), Some("sess-2"));
    }

    #[test]
    fn picker_selection_is_clamped() {
        let mut picker = SessionPicker {
            sessions: vec![summary("a"), summary("b"), summary("c")],
            ..SessionPicker::default()
        };
        picker.open();

        picker.move_selection(5);
        assert_eq!(picker.selected_index(), 2);
        picker.move_selection(-1);
        assert_eq!(picker.selected().map(|s| s.session_id.as_str()), Some("b"));
        picker.move_selection(-10);
        assert_eq!(picker.selected_index(), 0);
        assert!(picker.is_visible());
    }
}
