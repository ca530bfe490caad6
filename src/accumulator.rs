//! Per-turn streaming state and the artifact dispatch table.
//!
//! The accumulator owns the in-flight assistant and thinking buffers of one
//! turn and decides, per classified event, whether to create, extend or close
//! a timeline entry. It never touches session identifiers; the owning session
//! does that from the same classified event.

use std::collections::HashSet;

use chat_protocol::{ConversationEntry, EntryRole, ToolStatus};

use crate::classifier::{ArtifactEvent, ClassifiedEvent, MessageEvent, MessageRole, StatusEvent};
use crate::timeline::{capture_timestamp, new_entry_id, Timeline};
use crate::tool_call::{correlate, tool_call_id_of};

/// Content used for generic artifacts that carry no text.
pub const EMPTY_ARTIFACT_CONTENT: &str = "Artifact received";

/// Prefix of the status entry appended when a turn's stream fails.
pub const ERROR_PREFIX: &str = "Error: ";

#[derive(Debug, Default)]
pub struct StreamingAccumulator {
    assistant_id: Option<String>,
    assistant_open: bool,
    assistant_buffer: String,
    thinking_id: Option<String>,
    thinking_buffer: String,
    saw_streaming_output: bool,
    final_output_rendered: bool,
    /// Tool call ids that already have an entry in the timeline.
    represented_tool_calls: HashSet<String>,
}

impl StreamingAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an accumulator for replaying persisted events.
    ///
    /// `tool_result` artifacts whose `toolCallId` is in `represented` are skipped,
    /// as are repeated results for a call id seen earlier.
    #[must_use]
    pub fn for_replay(represented: HashSet<String>) -> Self {
        Self {
            represented_tool_calls: represented,
            ..Self::default()
        }
    }

    /// Clears all per-turn state. Represented tool call ids survive.
    pub fn reset(&mut self) {
        let represented = std::mem::take(&mut self.represented_tool_calls);
        *self = Self::for_replay(represented);
    }

    #[must_use]
    pub fn assistant_id(&self) -> Option<&str> {
        self.assistant_id.as_deref()
    }

    /// Id of the assistant entry while it is still streaming.
    #[must_use]
    pub fn open_assistant_id(&self) -> Option<&str> {
        self.assistant_id.as_deref().filter(|_| self.assistant_open)
    }

    #[must_use]
    pub fn thinking_id(&self) -> Option<&str> {
        self.thinking_id.as_deref()
    }

    #[must_use]
    pub fn saw_streaming_output(&self) -> bool {
        self.saw_streaming_output
    }

    #[must_use]
    pub fn final_output_rendered(&self) -> bool {
        self.final_output_rendered
    }

    /// Applies one classified event to `timeline`.
    pub fn apply(&mut self, event: &ClassifiedEvent, timeline: &mut Timeline) {
        match event {
            ClassifiedEvent::Message(message) => self.apply_message(message, timeline),
            ClassifiedEvent::Status(status) => self.apply_status(status, timeline),
            ClassifiedEvent::Artifact(artifact) => self.apply_artifact(artifact, timeline),
        }
    }

    /// Ends a turn whose stream completed normally.
    ///
    /// A turn that produced no assistant entry gets an empty finished one so
    /// every turn has a terminal answer.
    pub fn finish_turn(&mut self, timeline: &mut Timeline) {
        self.close_open_entries(timeline);
        if self.assistant_id.is_none() {
            let id = new_entry_id();
            timeline.append(ConversationEntry::new(
                id.clone(),
                EntryRole::Assistant,
                "",
                capture_timestamp(),
            ));
            self.assistant_id = Some(id);
        }
    }

    /// Ends a turn whose stream failed. Partial entries are kept.
    pub fn fail_turn(&mut self, timeline: &mut Timeline, message: &str) {
        self.close_open_entries(timeline);
        timeline.append(ConversationEntry::new(
            new_entry_id(),
            EntryRole::Status,
            format!("{ERROR_PREFIX}{message}"),
            capture_timestamp(),
        ));
    }

    /// Closes the open thinking and assistant entries, if any.
    pub fn close_open_entries(&mut self, timeline: &mut Timeline) {
        self.close_thinking(timeline);
        self.close_assistant(timeline);
    }

    /// Closes open entries and clears per-turn state at a turn boundary.
    pub fn close_turn(&mut self, timeline: &mut Timeline) {
        self.close_open_entries(timeline);
        self.reset();
    }

    fn apply_message(&mut self, message: &MessageEvent, timeline: &mut Timeline) {
        if message.role != MessageRole::Agent || message.text.is_empty() {
            return;
        }
        self.set_assistant_text(message.text.clone(), timeline);
    }

    fn apply_status(&mut self, status: &StatusEvent, timeline: &mut Timeline) {
        if let Some(text) = &status.message {
            let entry = ConversationEntry::new(
                new_entry_id(),
                EntryRole::Status,
                text.clone(),
                capture_timestamp(),
            );
            timeline.append_keeping_assistant_last(entry, self.open_assistant_id());
        }

        if status.is_terminal() {
            self.close_assistant(timeline);
        }
    }

    fn apply_artifact(&mut self, artifact: &ArtifactEvent, timeline: &mut Timeline) {
        match artifact.name.as_str() {
            "output_start" => {}
            "output_delta" => self.append_output_delta(&artifact.text, timeline),
            "output_end" | "full_output" => self.render_final_output(&artifact.text, timeline),
            "thinking_start" => {
                self.close_thinking(timeline);
                self.open_thinking(timeline);
                self.append_thinking_delta(&artifact.text, timeline);
            }
            "thinking_delta" => self.append_thinking_delta(&artifact.text, timeline),
            "thinking_end" => {
                if !artifact.text.is_empty() {
                    if self.thinking_id.is_none() {
                        self.open_thinking(timeline);
                    }
                    self.thinking_buffer = artifact.text.clone();
                    self.sync_thinking(timeline);
                }
                self.close_thinking(timeline);
            }
            "tool_result" => {
                self.close_thinking(timeline);
                self.append_tool_call(artifact, timeline);
            }
            "tool_call" => self.close_thinking(timeline),
            _ => {
                let content = if artifact.text.is_empty() {
                    EMPTY_ARTIFACT_CONTENT.to_string()
                } else {
                    artifact.text.clone()
                };
                let entry = ConversationEntry::new(
                    new_entry_id(),
                    EntryRole::Tool,
                    content,
                    capture_timestamp(),
                )
                .with_tool(artifact.name.clone(), ToolStatus::Success);
                timeline.append_keeping_assistant_last(entry, self.open_assistant_id());
            }
        }
    }

    fn append_output_delta(&mut self, delta: &str, timeline: &mut Timeline) {
        if self.final_output_rendered {
            tracing::trace!("ignoring output delta after final output");
            return;
        }
        if self.assistant_id.is_some() && !self.assistant_open {
            tracing::trace!("ignoring output delta for a closed assistant entry");
            return;
        }
        self.saw_streaming_output = true;
        if delta.is_empty() {
            return;
        }

        self.assistant_buffer.push_str(delta);
        self.sync_assistant(timeline);
    }

    fn render_final_output(&mut self, text: &str, timeline: &mut Timeline) {
        if self.final_output_rendered {
            tracing::trace!("ignoring repeated final output");
            return;
        }
        self.final_output_rendered = true;

        // Empty final text keeps whatever was streamed.
        if !text.is_empty() {
            self.set_assistant_text(text.to_string(), timeline);
        }
        self.close_assistant(timeline);
    }

    fn set_assistant_text(&mut self, text: String, timeline: &mut Timeline) {
        self.assistant_buffer = text;
        self.sync_assistant(timeline);
    }

    /// Writes the assistant buffer into its entry, creating an open entry on
    /// first use. An entry removed from the timeline is not recreated.
    fn sync_assistant(&mut self, timeline: &mut Timeline) {
        let content = self.assistant_buffer.clone();
        match &self.assistant_id {
            Some(id) => {
                if !timeline.update_by_id(id, |entry| entry.content = content) {
                    tracing::trace!(id = %id, "assistant entry no longer in timeline");
                }
            }
            None => {
                let id = new_entry_id();
                timeline.append(
                    ConversationEntry::new(id.clone(), EntryRole::Assistant, content, capture_timestamp())
                        .streaming(true),
                );
                self.assistant_id = Some(id);
                self.assistant_open = true;
            }
        }
    }

    fn close_assistant(&mut self, timeline: &mut Timeline) {
        if !self.assistant_open {
            return;
        }
        self.assistant_open = false;
        if let Some(id) = &self.assistant_id {
            timeline.update_by_id(id, |entry| entry.streaming = false);
        }
    }

    fn open_thinking(&mut self, timeline: &mut Timeline) {
        let id = new_entry_id();
        let entry = ConversationEntry::new(id.clone(), EntryRole::Thinking, "", capture_timestamp())
            .streaming(true);
        timeline.append_keeping_assistant_last(entry, self.open_assistant_id());
        self.thinking_id = Some(id);
        self.thinking_buffer.clear();
    }

    fn append_thinking_delta(&mut self, delta: &str, timeline: &mut Timeline) {
        if delta.is_empty() {
            return;
        }
        if self.thinking_id.is_none() {
            self.open_thinking(timeline);
        }
        self.thinking_buffer.push_str(delta);
        self.sync_thinking(timeline);
    }

    fn sync_thinking(&self, timeline: &mut Timeline) {
        if let Some(id) = &self.thinking_id {
            let content = self.thinking_buffer.clone();
            timeline.update_by_id(id, |entry| entry.content = content);
        }
    }

    fn close_thinking(&mut self, timeline: &mut Timeline) {
        if let Some(id) = self.thinking_id.take() {
            timeline.update_by_id(&id, |entry| entry.streaming = false);
        }
        self.thinking_buffer.clear();
    }

    fn append_tool_call(&mut self, artifact: &ArtifactEvent, timeline: &mut Timeline) {
        if let Some(tool_call_id) = artifact.first_data().and_then(tool_call_id_of) {
            if !self.represented_tool_calls.insert(tool_call_id.to_string()) {
                tracing::trace!(tool_call_id, "skipping tool result already in the timeline");
                return;
            }
        }

        let entry = correlate(artifact).into_entry(new_entry_id(), capture_timestamp());
        timeline.append_keeping_assistant_last(entry, self.open_assistant_id());
    }
}
