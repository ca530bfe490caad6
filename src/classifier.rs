//! Stateless normalization of raw protocol events.
//!
//! Unknown or malformed events classify to `None`. Protocol extensions must
//! never reach the reducer as errors, so nothing here fails.

use chat_protocol::{RawEvent, TaskState};
use serde_json::{Map, Value};

/// Artifact name used when an artifact omits `name`.
pub const UNNAMED_ARTIFACT: &str = "Artifact";

/// Correlation ids carried by an event, when present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventIds {
    pub task_id: Option<String>,
    pub context_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageRole {
    Agent,
    User,
    Other(String),
}

impl MessageRole {
    fn parse(value: Option<&str>) -> Self {
        match value {
            Some("agent") => Self::Agent,
            Some("user") => Self::User,
            other => Self::Other(other.unwrap_or_default().to_string()),
        }
    }
}

/// Top-level `message` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEvent {
    pub role: MessageRole,
    pub text: String,
    pub ids: EventIds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusSource {
    StatusUpdate,
    Task,
}

/// `status-update` or `task` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    pub source: StatusSource,
    pub state: String,
    /// Text of the embedded status message, when it has any.
    pub message: Option<String>,
    pub is_final: bool,
    pub ids: EventIds,
}

impl StatusEvent {
    #[must_use]
    pub fn task_state(&self) -> Option<TaskState> {
        TaskState::parse(&self.state)
    }

    /// Final and not waiting for another user message.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.is_final && !self.task_state().is_some_and(|state| state.awaits_input())
    }
}

/// `artifact-update` event.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactEvent {
    pub name: String,
    /// All `text` parts concatenated without separator.
    pub text: String,
    /// Object payloads of all `data` parts, in part order.
    pub data: Vec<Map<String, Value>>,
    pub ids: EventIds,
}

impl ArtifactEvent {
    #[must_use]
    pub fn first_data(&self) -> Option<&Map<String, Value>> {
        self.data.first()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassifiedEvent {
    Message(MessageEvent),
    Status(StatusEvent),
    Artifact(ArtifactEvent),
}

impl ClassifiedEvent {
    #[must_use]
    pub fn ids(&self) -> &EventIds {
        match self {
            Self::Message(event) => &event.ids,
            Self::Status(event) => &event.ids,
            Self::Artifact(event) => &event.ids,
        }
    }
}

/// Classifies one raw event. Returns `None` for anything the reducer should skip.
pub fn classify(raw: &RawEvent) -> Option<ClassifiedEvent> {
    let object = raw.as_object()?;
    let kind = object.get("kind")?.as_str()?;

    match kind {
        "message" => Some(ClassifiedEvent::Message(MessageEvent {
            role: MessageRole::parse(str_field(object, "role")),
            text: text_from_parts(object.get("parts")),
            ids: EventIds {
                task_id: string_field(object, "taskId"),
                context_id: string_field(object, "contextId"),
            },
        })),
        "status-update" => Some(ClassifiedEvent::Status(status_event(
            object,
            StatusSource::StatusUpdate,
            string_field(object, "taskId"),
        ))),
        "task" => Some(ClassifiedEvent::Status(status_event(
            object,
            StatusSource::Task,
            string_field(object, "id"),
        ))),
        "artifact-update" => artifact_event(object).map(ClassifiedEvent::Artifact),
        _ => None,
    }
}

fn status_event(
    object: &Map<String, Value>,
    source: StatusSource,
    task_id: Option<String>,
) -> StatusEvent {
    let status = object.get("status").and_then(Value::as_object);
    let state = status
        .and_then(|status| str_field(status, "state"))
        .unwrap_or("unknown")
        .to_string();
    let message = status
        .and_then(|status| status.get("message"))
        .and_then(Value::as_object)
        .map(|message| text_from_parts(message.get("parts")))
        .filter(|text| !text.is_empty());

    StatusEvent {
        source,
        state,
        message,
        is_final: object.get("final").and_then(Value::as_bool).unwrap_or(false),
        ids: EventIds {
            task_id,
            context_id: string_field(object, "contextId"),
        },
    }
}

fn artifact_event(object: &Map<String, Value>) -> Option<ArtifactEvent> {
    let artifact = object.get("artifact")?.as_object()?;
    let parts = artifact.get("parts")?.as_array()?;

    Some(ArtifactEvent {
        name: str_field(artifact, "name")
            .unwrap_or(UNNAMED_ARTIFACT)
            .to_string(),
        text: join_text_parts(parts),
        data: parts
            .iter()
            .filter(|part| part_kind(part) == Some("data"))
            .filter_map(|part| part.get("data")?.as_object().cloned())
            .collect(),
        ids: EventIds {
            task_id: string_field(object, "taskId"),
            context_id: string_field(object, "contextId"),
        },
    })
}

fn text_from_parts(parts: Option<&Value>) -> String {
    parts
        .and_then(Value::as_array)
        .map(|parts| join_text_parts(parts))
        .unwrap_or_default()
}

fn join_text_parts(parts: &[Value]) -> String {
    parts
        .iter()
        .filter(|part| part_kind(part) == Some("text"))
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect()
}

fn part_kind(part: &Value) -> Option<&str> {
    part.get("kind").and_then(Value::as_str)
}

fn str_field<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    object.get(key).and_then(Value::as_str)
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    str_field(object, key)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}
