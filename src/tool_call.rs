//! Turns `tool_result` artifacts into finished `tool-call` timeline entries.

use chat_protocol::{ConversationEntry, EntryRole, ToolStatus};
use serde_json::{Map, Value};

use crate::classifier::ArtifactEvent;

/// Display variant selected from a tool name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolView {
    Generic,
    TodoList,
    WebSearch,
}

impl ToolView {
    #[must_use]
    pub fn for_tool_name(tool_name: &str) -> Self {
        match normalize_tool_name(tool_name).as_str() {
            "todowrite" | "todoread" | "todoadd" | "todoupdate" | "tododelete" => Self::TodoList,
            "web_search" | "fetch_web_page" => Self::WebSearch,
            _ => Self::Generic,
        }
    }
}

/// Lower-cases and trims `name`, mapping every `-` and whitespace char to `_`.
#[must_use]
pub fn normalize_tool_name(name: &str) -> String {
    name.trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(|ch| if ch == '-' || ch.is_whitespace() { '_' } else { ch })
        .collect()
}

/// Renders a JSON value for text-only displays.
///
/// Strings pass through verbatim, null renders empty, anything else is
/// pretty-printed with two-space indentation.
#[must_use]
pub fn pretty_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

/// One correlated tool invocation and its outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRecord {
    pub tool_name: String,
    pub tool_call_id: Option<String>,
    pub args: Option<Value>,
    pub result: Option<Value>,
    pub status: ToolStatus,
    pub params_text: String,
    pub result_text: String,
}

impl ToolCallRecord {
    #[must_use]
    pub fn view(&self) -> ToolView {
        ToolView::for_tool_name(&self.tool_name)
    }

    /// Builds the finished timeline entry for this call.
    #[must_use]
    pub fn into_entry(self, id: String, timestamp: String) -> ConversationEntry {
        let mut entry = ConversationEntry::new(id, EntryRole::ToolCall, self.result_text.clone(), timestamp)
            .with_tool(self.tool_name, self.status);
        entry.tool_call_id = self.tool_call_id;
        entry.tool_call_args = self.args;
        entry.tool_result_data = self.result;
        entry.tool_call_params = Some(self.params_text);
        entry.tool_result = Some(self.result_text);
        entry
    }
}

/// Extracts the tool call carried by a `tool_result` artifact.
///
/// Only the first object data part is read; further parts are ignored.
#[must_use]
pub fn correlate(artifact: &ArtifactEvent) -> ToolCallRecord {
    let data = artifact.first_data();
    let field = |key: &str| data.and_then(|data| data.get(key));

    let tool_name = field("toolName")
        .and_then(Value::as_str)
        .unwrap_or(artifact.name.as_str())
        .to_string();
    let tool_call_id = field("toolCallId")
        .and_then(Value::as_str)
        .map(ToString::to_string);
    let status = if field("ok").and_then(Value::as_bool) == Some(false) {
        ToolStatus::Error
    } else {
        ToolStatus::Success
    };
    let result_text = match data {
        Some(data) => pretty_text(data.get("result")),
        None => artifact.text.clone(),
    };

    ToolCallRecord {
        tool_name,
        tool_call_id,
        args: field("args").cloned(),
        result: field("result").cloned(),
        status,
        params_text: pretty_text(field("args")),
        result_text,
    }
}

/// Returns the `toolCallId` a raw `tool_result` payload would correlate to.
pub(crate) fn tool_call_id_of(data: &Map<String, Value>) -> Option<&str> {
    data.get("toolCallId").and_then(Value::as_str)
}
