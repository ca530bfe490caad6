//! Minimal provider-agnostic contract between the conversation reducer and
//! the collaborators that feed it.
//!
//! This crate defines only the shared shapes: raw protocol events, the
//! outgoing user message, the streaming transport and session-history
//! traits, and the persisted conversation entry. It excludes wire encoding,
//! HTTP plumbing and any reducer state.

mod entry;
mod session;

use std::fmt;
use std::future::Future;

use futures_util::stream::BoxStream;
use serde_json::{json, Value};

pub use entry::{ConversationEntry, EntryRole, ToolStatus};
pub use session::{SessionRecord, SessionSummary};

/// One already-deserialized protocol event as yielded by the streaming client.
///
/// Events stay untyped JSON so unknown kinds and protocol extensions flow
/// through to the classifier instead of failing deserialization.
pub type RawEvent = Value;

/// Event sequence for one outstanding turn.
pub type EventStream<'a> = BoxStream<'a, Result<RawEvent, TransportError>>;

/// Error yielded by a transport while a turn's event stream is being consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    message: String,
}

impl TransportError {
    /// Creates a new transport error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the underlying error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TransportError {}

impl From<String> for TransportError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for TransportError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Error returned by a session-history source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSourceError {
    /// The requested session does not exist in the source.
    NotFound { session_id: String },
    /// The source could not be reached or returned unusable data.
    Unavailable { message: String },
}

impl SessionSourceError {
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

impl fmt::Display for SessionSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { session_id } => write!(f, "session '{session_id}' not found"),
            Self::Unavailable { message } => f.write_str(message),
        }
    }
}

impl std::error::Error for SessionSourceError {}

/// Parsed task status state carried by `status-update` and `task` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    Submitted,
    Working,
    InputRequired,
    AuthRequired,
    Completed,
    Canceled,
    Failed,
    Rejected,
    Unknown,
}

impl TaskState {
    pub fn parse(value: &str) -> Option<Self> {
        Some(match value {
            "submitted" => Self::Submitted,
            "working" => Self::Working,
            "input-required" => Self::InputRequired,
            "auth-required" => Self::AuthRequired,
            "completed" => Self::Completed,
            "canceled" => Self::Canceled,
            "failed" => Self::Failed,
            "rejected" => Self::Rejected,
            "unknown" => Self::Unknown,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Working => "working",
            Self::InputRequired => "input-required",
            Self::AuthRequired => "auth-required",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
            Self::Failed => "failed",
            Self::Rejected => "rejected",
            Self::Unknown => "unknown",
        }
    }

    /// Returns true when the agent is paused waiting for another user message.
    #[must_use]
    pub fn awaits_input(&self) -> bool {
        matches!(self, Self::InputRequired)
    }
}

/// User-authored message sent to open a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub message_id: String,
    pub text: String,
    pub context_id: Option<String>,
    pub task_id: Option<String>,
}

impl OutgoingMessage {
    #[must_use]
    pub fn user_text(message_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            text: text.into(),
            context_id: None,
            task_id: None,
        }
    }

    #[must_use]
    pub fn with_context_id(mut self, context_id: Option<impl Into<String>>) -> Self {
        self.context_id = context_id.map(Into::into);
        self
    }

    #[must_use]
    pub fn with_task_id(mut self, task_id: Option<impl Into<String>>) -> Self {
        self.task_id = task_id.map(Into::into);
        self
    }

    /// Renders the protocol message object. Absent ids are omitted, not null.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut message = json!({
            "kind": "message",
            "messageId": self.message_id,
            "role": "user",
            "parts": [{ "kind": "text", "text": self.text }],
        });

        if let Some(context_id) = &self.context_id {
            message["contextId"] = Value::String(context_id.clone());
        }
        if let Some(task_id) = &self.task_id {
            message["taskId"] = Value::String(task_id.clone());
        }

        message
    }
}

/// Streaming client for one agent endpoint.
pub trait EventTransport: Send + Sync {
    /// Sends `message` and yields the agent's events in arrival order.
    ///
    /// Failures to open the stream are reported as the first item of the
    /// returned stream rather than out of band.
    fn send_message_stream(&self, message: OutgoingMessage) -> EventStream<'_>;
}

/// Read side of persisted conversation history.
pub trait SessionSource: Send + Sync {
    /// Lists the most recent sessions, newest first, at most `limit` items.
    fn list_sessions(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<SessionSummary>, SessionSourceError>> + Send;

    /// Fetches one session's persisted entries and raw events.
    fn fetch_session(
        &self,
        session_id: &str,
    ) -> impl Future<Output = Result<SessionRecord, SessionSourceError>> + Send;
}
