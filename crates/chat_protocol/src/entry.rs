use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Display role of one timeline entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryRole {
    /// Persisted histories call this role `user`.
    #[serde(alias = "user")]
    Human,
    Assistant,
    Thinking,
    Tool,
    ToolCall,
    Status,
}

impl EntryRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::Assistant => "assistant",
            Self::Thinking => "thinking",
            Self::Tool => "tool",
            Self::ToolCall => "tool-call",
            Self::Status => "status",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Success,
    Error,
    Running,
}

/// The unit of display in a conversation timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationEntry {
    pub id: String,
    pub role: EntryRole,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub streaming: bool,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_status: Option<ToolStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_args: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_result_data: Option<Value>,
    /// Pre-rendered call parameters for renderers without structured views.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_params: Option<String>,
    /// Pre-rendered result text for renderers without structured views.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_result: Option<String>,
}

impl ConversationEntry {
    /// Creates a finished, tool-less entry.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        role: EntryRole,
        content: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            role,
            content: content.into(),
            streaming: false,
            timestamp: timestamp.into(),
            tool_name: None,
            tool_status: None,
            tool_call_id: None,
            tool_call_args: None,
            tool_result_data: None,
            tool_call_params: None,
            tool_result: None,
        }
    }

    #[must_use]
    pub fn streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    #[must_use]
    pub fn with_tool(mut self, tool_name: impl Into<String>, status: ToolStatus) -> Self {
        self.tool_name = Some(tool_name.into());
        self.tool_status = Some(status);
        self
    }

    #[must_use]
    pub fn is_tool_call(&self) -> bool {
        self.role == EntryRole::ToolCall
    }
}
