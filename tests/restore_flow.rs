mod support;

use buddy_chat::{ChatSession, ConversationEntry, EntryRole, SessionPicker, ToolStatus, RESTORED_STATUS};
use chat_protocol_mock::{events, MemorySessionSource, ScriptedTransport};
use pretty_assertions::assert_eq;
use serde_json::json;

use support::{assert_all_closed, contents, roles, session_record};

fn entry(id: &str, role: EntryRole, content: &str) -> ConversationEntry {
    ConversationEntry::new(id, role, content, "08:00")
}

fn persisted_tool_call(id: &str, tool_call_id: &str) -> ConversationEntry {
    let mut entry = entry(id, EntryRole::ToolCall, "[]").with_tool("todoread", ToolStatus::Success);
    entry.tool_call_id = Some(tool_call_id.to_string());
    entry
}

#[test]
fn restore_appends_only_events_missing_from_history() {
    let record = session_record(
        "sess-1",
        "2026-03-01T09:00:00Z",
        vec![entry("a", EntryRole::Human, "A"), entry("b", EntryRole::Assistant, "B")],
        vec![events::status_update("working", false, Some("Still indexing"))],
    );
    let mut session = ChatSession::new();

    session.restore(&record);

    assert_eq!(
        roles(session.entries()),
        vec![EntryRole::Human, EntryRole::Assistant, EntryRole::Status]
    );
    assert_eq!(session.entries()[0].id, "a");
    assert_eq!(session.entries()[1].id, "b");
    assert_eq!(session.entries()[2].content, "Still indexing");
    assert_eq!(session.status_text(), "working");
}

#[test]
fn restore_without_status_events_reports_restored_session() {
    let record = session_record(
        "sess-0",
        "2026-03-01T09:00:00Z",
        vec![entry("a", EntryRole::Human, "A")],
        vec![events::task("t-1", "ctx-0", "completed")],
    );
    let mut session = ChatSession::new();

    session.restore(&record);

    assert_eq!(session.status_text(), RESTORED_STATUS);
}

#[test]
fn restore_replays_each_turn_separately() {
    let record = session_record(
        "sess-5",
        "2026-03-01T09:00:00Z",
        vec![
            entry("q1", EntryRole::Human, "q1"),
            entry("a1", EntryRole::Assistant, "First answer."),
            entry("q2", EntryRole::Human, "q2"),
            entry("a2", EntryRole::Assistant, "Second answer."),
        ],
        vec![
            events::output_delta("First answer."),
            events::status_update("completed", true, None),
            events::output_delta("Second answer."),
            events::status_update("completed", true, None),
        ],
    );
    let mut session = ChatSession::new();

    let summary = session.restore(&record);

    assert_eq!(summary.replayed, 2);
    assert_eq!(summary.appended, 0);
    assert_eq!(
        contents(session.entries()),
        vec!["q1", "First answer.", "q2", "Second answer."]
    );
    assert_all_closed(session.entries());
}

#[test]
fn restore_after_final_output_still_replays_later_turns() {
    let record = session_record(
        "sess-6",
        "2026-03-01T09:00:00Z",
        vec![entry("q1", EntryRole::Human, "q1"), entry("a1", EntryRole::Assistant, "One.")],
        vec![
            events::user_message("q1"),
            events::output_end("One."),
            events::user_message("q2"),
            events::output_delta("Two"),
            events::output_delta("."),
        ],
    );
    let mut session = ChatSession::new();

    let summary = session.restore(&record);

    assert_eq!(summary.appended, 1);
    assert_eq!(contents(session.entries()), vec!["q1", "One.", "Two."]);
    assert_all_closed(session.entries());
}

#[test]
fn restore_replay_of_full_history_adds_nothing() {
    let record = session_record(
        "sess-2",
        "2026-03-01T09:00:00Z",
        vec![
            entry("h", EntryRole::Human, "list todos"),
            entry("t", EntryRole::Thinking, "checking"),
            persisted_tool_call("c", "call-1"),
            entry("a", EntryRole::Assistant, "Nothing to do."),
        ],
        vec![
            events::thinking_start("checking"),
            events::tool_result(json!({ "toolName": "todoread", "toolCallId": "call-1", "result": [] })),
            events::output_delta("Nothing "),
            events::output_delta("to do."),
            events::status_update("completed", true, None),
        ],
    );
    let mut session = ChatSession::new();

    let summary = session.restore(&record);

    assert_eq!(summary.persisted, 4);
    assert_eq!(summary.appended, 0);
    assert_eq!(session.entries().len(), 4);
    assert_eq!(session.context_id(), Some("ctx-1"));
    assert_eq!(session.task_id(), None);
    assert_all_closed(session.entries());
}

#[test]
fn restore_forces_persisted_entries_closed() {
    let record = session_record(
        "sess-3",
        "2026-03-01T09:00:00Z",
        vec![entry("a", EntryRole::Assistant, "cut off").streaming(true)],
        Vec::new(),
    );
    let mut session = ChatSession::new();

    session.restore(&record);

    assert_all_closed(session.entries());
    assert_eq!(session.context_id(), Some("sess-3"));
}

#[tokio::test]
async fn restored_conversation_continues_with_session_context() {
    let record = session_record(
        "sess-4",
        "2026-03-01T09:00:00Z",
        vec![entry("h", EntryRole::Human, "hi"), entry("a", EntryRole::Assistant, "hello")],
        Vec::new(),
    );
    let transport = ScriptedTransport::new().with_turn(vec![events::output_end("welcome back")]);
    let mut session = ChatSession::new();
    session.restore(&record);

    session.send_turn(&transport, "I'm back").await;

    assert_eq!(
        contents(session.entries()),
        vec!["hi", "hello", "I'm back", "welcome back"]
    );
    let sent = transport.sent_messages();
    assert_eq!(sent[0].context_id.as_deref(), Some("sess-4"));
    assert_eq!(sent[0].task_id, None);
}

#[tokio::test]
async fn picker_lists_newest_first_and_restores_selection() {
    let source = MemorySessionSource::new(vec![
        session_record("older", "2026-03-01T09:00:00Z", vec![entry("o", EntryRole::Human, "old")], Vec::new()),
        session_record("newer", "2026-03-02T09:00:00Z", vec![entry("n", EntryRole::Human, "new")], Vec::new()),
    ]);
    let mut picker = SessionPicker::new();
    let mut session = ChatSession::new();

    assert!(picker.load_sessions(&source, 20).await);
    picker.open();
    let ids: Vec<_> = picker
        .sessions()
        .iter()
        .map(|summary| summary.session_id.as_str())
        .collect();
    assert_eq!(ids, vec!["newer", "older"]);

    picker.move_selection(1);
    let summary = picker
        .restore_selected(&source, &mut session)
        .await
        .expect("restore succeeds");

    assert_eq!(summary.persisted, 1);
    assert_eq!(contents(session.entries()), vec!["old"]);
    assert_eq!(source.fetch_count("older"), 1);
    assert!(!picker.is_visible());
    assert_eq!(picker.error(), None);
}

#[tokio::test]
async fn picker_failures_leave_the_timeline_untouched() {
    let transport = ScriptedTransport::new().with_turn(vec![events::output_end("kept")]);
    let mut session = ChatSession::new();
    session.send_turn(&transport, "current").await;
    let before = session.entries().to_vec();

    let mut picker = SessionPicker::new();
    let missing = MemorySessionSource::new(Vec::new());
    assert_eq!(picker.restore_into(&missing, "gone", &mut session).await, None);
    assert_eq!(
        picker.error(),
        Some("Failed to restore session: session 'gone' not found")
    );

    let offline = MemorySessionSource::failing("connection refused");
    assert!(!picker.load_sessions(&offline, 20).await);
    assert_eq!(
        picker.error(),
        Some("Failed to load sessions: connection refused")
    );

    assert_eq!(session.entries(), before.as_slice());
}
