//! Builders for raw protocol events in the shapes agents actually emit.

use chat_protocol::RawEvent;
use serde_json::{json, Value};

/// `artifact-update` with one text part.
pub fn artifact(name: &str, text: &str) -> RawEvent {
    json!({
        "kind": "artifact-update",
        "taskId": "task-1",
        "contextId": "ctx-1",
        "artifact": {
            "artifactId": format!("{name}-artifact"),
            "name": name,
            "parts": [{ "kind": "text", "text": text }],
        },
    })
}

/// `artifact-update` with explicit parts.
pub fn artifact_with_parts(name: &str, parts: Vec<Value>) -> RawEvent {
    json!({
        "kind": "artifact-update",
        "artifact": { "name": name, "parts": parts },
    })
}

pub fn output_delta(text: &str) -> RawEvent {
    artifact("output_delta", text)
}

pub fn output_end(text: &str) -> RawEvent {
    artifact("output_end", text)
}

pub fn thinking_start(text: &str) -> RawEvent {
    artifact("thinking_start", text)
}

pub fn thinking_delta(text: &str) -> RawEvent {
    artifact("thinking_delta", text)
}

pub fn thinking_end(text: &str) -> RawEvent {
    artifact("thinking_end", text)
}

/// `tool_result` artifact carrying one structured payload.
pub fn tool_result(data: Value) -> RawEvent {
    artifact_with_parts("tool_result", vec![json!({ "kind": "data", "data": data })])
}

/// Agent-authored top-level message.
pub fn agent_message(text: &str) -> RawEvent {
    json!({
        "kind": "message",
        "messageId": "agent-message",
        "role": "agent",
        "parts": [{ "kind": "text", "text": text }],
    })
}

/// User message echoed back by the agent, as stored in session event logs.
pub fn user_message(text: &str) -> RawEvent {
    json!({
        "kind": "message",
        "messageId": "user-message",
        "role": "user",
        "parts": [{ "kind": "text", "text": text }],
    })
}

/// `status-update`; `message` becomes the embedded status message text.
pub fn status_update(state: &str, is_final: bool, message: Option<&str>) -> RawEvent {
    let mut status = json!({ "state": state });
    if let Some(text) = message {
        status["message"] = json!({
            "kind": "message",
            "role": "agent",
            "parts": [{ "kind": "text", "text": text }],
        });
    }

    json!({
        "kind": "status-update",
        "taskId": "task-1",
        "contextId": "ctx-1",
        "final": is_final,
        "status": status,
    })
}

/// `task` snapshot.
pub fn task(task_id: &str, context_id: &str, state: &str) -> RawEvent {
    json!({
        "kind": "task",
        "id": task_id,
        "contextId": context_id,
        "status": { "state": state },
    })
}
