mod support;

use std::sync::{Arc, Mutex};

use buddy_chat::{ChatSession, EntryRole, TimelineChange, ToolStatus, ToolView, TurnOutcome};
use chat_protocol_mock::events::{self, agent_message};
use chat_protocol_mock::{ScriptStep, ScriptedTransport};
use pretty_assertions::assert_eq;
use serde_json::json;

use support::{assert_all_closed, contents, roles};

#[tokio::test]
async fn thinking_tool_and_output_turn_is_ordered_and_closed() {
    let transport = ScriptedTransport::new().with_turn(vec![
        events::task("task-1", "ctx-1", "submitted"),
        events::thinking_start("I should check the todo list."),
        events::thinking_end(""),
        events::tool_result(json!({
            "toolName": "todoread",
            "toolCallId": "c1",
            "args": {},
            "result": [],
            "ok": true,
        })),
        events::output_delta("You have "),
        events::output_delta("no todos."),
        events::output_end(""),
        events::status_update("completed", true, None),
    ]);
    let mut session = ChatSession::new();

    let outcome = session.send_turn(&transport, "what is on my list?").await;

    assert_eq!(outcome, TurnOutcome::Completed);
    let entries = session.entries();
    assert_eq!(
        roles(entries),
        vec![
            EntryRole::Human,
            EntryRole::Thinking,
            EntryRole::ToolCall,
            EntryRole::Assistant,
        ]
    );
    assert_eq!(
        contents(entries),
        vec![
            "what is on my list?",
            "I should check the todo list.",
            "[]",
            "You have no todos.",
        ]
    );
    assert_all_closed(entries);

    let tool = &entries[2];
    assert_eq!(tool.tool_name.as_deref(), Some("todoread"));
    assert_eq!(tool.tool_call_id.as_deref(), Some("c1"));
    assert_eq!(tool.tool_status, Some(ToolStatus::Success));
    assert_eq!(ToolView::for_tool_name(tool.tool_name.as_deref().unwrap_or_default()), ToolView::TodoList);
    assert_eq!(session.task_id(), None);
    assert_eq!(session.context_id(), Some("ctx-1"));
    assert_eq!(session.status_text(), "completed");
}

#[tokio::test]
async fn deltas_concatenate_into_one_assistant_entry() {
    let pieces = ["The ", "quick ", "brown ", "fox"];
    let transport = ScriptedTransport::new()
        .with_turn(pieces.iter().map(|piece| events::output_delta(piece)).collect());
    let mut session = ChatSession::new();

    session.send_turn(&transport, "go").await;

    let assistants: Vec<_> = session
        .entries()
        .iter()
        .filter(|entry| entry.role == EntryRole::Assistant)
        .collect();
    assert_eq!(assistants.len(), 1);
    assert_eq!(assistants[0].content, pieces.concat());
    assert!(!assistants[0].streaming);
}

#[tokio::test]
async fn failed_tool_call_is_marked_as_error() {
    let transport = ScriptedTransport::new().with_turn(vec![
        events::tool_result(json!({ "toolName": "Web-Search", "ok": false, "result": "rate limited" })),
        events::tool_result(json!({ "toolName": "WEB SEARCH", "result": { "hits": 2 } })),
        events::output_end("Searched twice."),
    ]);
    let mut session = ChatSession::new();

    session.send_turn(&transport, "search").await;

    let tools: Vec<_> = session
        .entries()
        .iter()
        .filter(|entry| entry.is_tool_call())
        .collect();
    assert_eq!(tools.len(), 2);
    assert_eq!(tools[0].tool_status, Some(ToolStatus::Error));
    assert_eq!(tools[0].content, "rate limited");
    assert_eq!(tools[1].tool_status, Some(ToolStatus::Success));
    assert_eq!(tools[1].content, "{\n  \"hits\": 2\n}");
    for tool in tools {
        assert_eq!(
            ToolView::for_tool_name(tool.tool_name.as_deref().unwrap_or_default()),
            ToolView::WebSearch
        );
    }
}

#[tokio::test]
async fn empty_turn_still_gets_a_finished_assistant_entry() {
    let transport = ScriptedTransport::new().with_turn(vec![events::status_update("completed", true, None)]);
    let mut session = ChatSession::new();

    session.send_turn(&transport, "anyone there?").await;

    assert_eq!(roles(session.entries()), vec![EntryRole::Human, EntryRole::Assistant]);
    assert_eq!(session.entries()[1].content, "");
    assert_all_closed(session.entries());
}

#[tokio::test]
async fn status_messages_and_artifacts_stay_above_streaming_answer() {
    let transport = ScriptedTransport::new().with_turn(vec![
        events::output_delta("Working on it"),
        events::status_update("working", false, Some("Reading repository")),
        events::artifact("plan.md", "1. read\n2. write"),
        events::output_delta("... done"),
    ]);
    let mut session = ChatSession::new();

    session.send_turn(&transport, "go").await;

    assert_eq!(
        roles(session.entries()),
        vec![
            EntryRole::Human,
            EntryRole::Status,
            EntryRole::Tool,
            EntryRole::Assistant,
        ]
    );
    assert_eq!(session.entries()[2].tool_name.as_deref(), Some("plan.md"));
    assert_eq!(session.entries()[3].content, "Working on it... done");
}

#[tokio::test]
async fn transport_failure_keeps_partial_entries_and_reports_once() {
    let transport = ScriptedTransport::new().with_steps(vec![
        ScriptStep::Event(events::thinking_start("planning")),
        ScriptStep::Event(events::output_delta("Here is")),
        ScriptStep::Fail("connection closed".to_string()),
    ]);
    let mut session = ChatSession::new();

    let outcome = session.send_turn(&transport, "go").await;

    assert!(matches!(outcome, TurnOutcome::Failed(_)));
    assert_eq!(
        roles(session.entries()),
        vec![
            EntryRole::Human,
            EntryRole::Thinking,
            EntryRole::Assistant,
            EntryRole::Status,
        ]
    );
    let errors = session
        .entries()
        .iter()
        .filter(|entry| entry.content.starts_with("Error: "))
        .count();
    assert_eq!(errors, 1);
    assert_all_closed(session.entries());
    assert!(!session.is_sending());
}

#[tokio::test]
async fn consecutive_turns_reuse_context_and_reset_streaming_state() {
    let transport = ScriptedTransport::new()
        .with_turn(vec![events::output_end("first answer")])
        .with_turn(vec![events::output_delta("second "), events::output_delta("answer")]);
    let mut session = ChatSession::new();

    session.send_turn(&transport, "one").await;
    session.send_turn(&transport, "two").await;

    assert_eq!(
        contents(session.entries()),
        vec!["one", "first answer", "two", "second answer"]
    );
    let sent = transport.sent_messages();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].context_id.is_some());
    assert_eq!(sent[0].context_id, sent[1].context_id);
    assert_ne!(sent[0].message_id, sent[1].message_id);
}

#[tokio::test]
async fn agent_message_is_authoritative_over_streamed_text() {
    let transport = ScriptedTransport::new().with_turn(vec![
        events::output_delta("draft text"),
        agent_message("Final text from the agent."),
    ]);
    let mut session = ChatSession::new();

    session.send_turn(&transport, "go").await;

    assert_eq!(
        contents(session.entries()),
        vec!["go", "Final text from the agent."]
    );
}

#[tokio::test]
async fn malformed_and_unknown_events_are_skipped() {
    let transport = ScriptedTransport::new().with_turn(vec![
        json!(null),
        json!({ "kind": "artifact-update", "artifact": { "name": "output_delta" } }),
        json!({ "kind": "heartbeat" }),
        events::output_delta("still fine"),
    ]);
    let mut session = ChatSession::new();

    let outcome = session.send_turn(&transport, "go").await;

    assert_eq!(outcome, TurnOutcome::Completed);
    assert_eq!(contents(session.entries()), vec!["go", "still fine"]);
}

#[tokio::test]
async fn listeners_see_every_timeline_mutation() {
    let transport = ScriptedTransport::new().with_turn(vec![
        events::output_delta("a"),
        events::output_delta("b"),
    ]);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut session = ChatSession::new();
    {
        let seen = Arc::clone(&seen);
        session.subscribe(move |change| seen.lock().expect("lock").push(change.clone()));
    }
    let mut changes = session.changes();

    session.send_turn(&transport, "go").await;

    let seen = seen.lock().expect("lock").clone();
    let mut received = Vec::new();
    while let Ok(change) = changes.try_recv() {
        received.push(change);
    }
    assert_eq!(seen, received);

    let assistant_id = session.entries()[1].id.clone();
    assert_eq!(
        seen.iter()
            .filter(|change| **change == TimelineChange::Updated { id: assistant_id.clone() })
            .count(),
        2
    );
    assert!(matches!(seen.first(), Some(TimelineChange::Appended { .. })));
}
