//! The explicitly owned chat session front-ends drive.

use chat_protocol::{
    ConversationEntry, EntryRole, EventTransport, OutgoingMessage, RawEvent, SessionRecord,
    TransportError,
};
use futures_util::StreamExt;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::accumulator::StreamingAccumulator;
use crate::classifier::{classify, ClassifiedEvent};
use crate::restore::{self, RestoreSummary};
use crate::timeline::{capture_timestamp, new_entry_id, Timeline, TimelineChange};

/// Status text shown after a session has been restored.
pub const RESTORED_STATUS: &str = "Restored session";

/// Result of one [`ChatSession::send_turn`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The input was blank; nothing was sent.
    Ignored,
    Completed,
    Failed(TransportError),
}

/// Conversation and task correlation ids, refreshed from incoming events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ConversationIds {
    pub(crate) context_id: Option<String>,
    pub(crate) task_id: Option<String>,
}

impl ConversationIds {
    /// Adopts ids from message and status events. Artifacts never refresh ids.
    pub(crate) fn observe(&mut self, event: &ClassifiedEvent) {
        if matches!(event, ClassifiedEvent::Artifact(_)) {
            return;
        }

        let ids = event.ids();
        if let Some(task_id) = &ids.task_id {
            self.task_id = Some(task_id.clone());
        }
        if let Some(context_id) = &ids.context_id {
            self.context_id = Some(context_id.clone());
        }
        if let ClassifiedEvent::Status(status) = event {
            if status.is_terminal() {
                self.task_id = None;
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct ChatSession {
    timeline: Timeline,
    accumulator: StreamingAccumulator,
    ids: ConversationIds,
    status_text: String,
    last_error: Option<String>,
    sending: bool,
}

impl ChatSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn timeline_mut(&mut self) -> &mut Timeline {
        &mut self.timeline
    }

    #[must_use]
    pub fn entries(&self) -> &[ConversationEntry] {
        self.timeline.entries()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&TimelineChange) + Send + 'static) {
        self.timeline.subscribe(listener);
    }

    pub fn changes(&mut self) -> UnboundedReceiver<TimelineChange> {
        self.timeline.changes()
    }

    #[must_use]
    pub fn context_id(&self) -> Option<&str> {
        self.ids.context_id.as_deref()
    }

    #[must_use]
    pub fn task_id(&self) -> Option<&str> {
        self.ids.task_id.as_deref()
    }

    /// Latest task state string, or a session-level notice.
    #[must_use]
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Message of the most recent transport failure, cleared by the next turn.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    #[must_use]
    pub fn is_sending(&self) -> bool {
        self.sending
    }

    /// Starts a turn for `text`, returning the message to send.
    ///
    /// Blank input starts nothing. The conversation context id is created on
    /// the first turn and reused afterwards.
    pub fn begin_turn(&mut self, text: &str) -> Option<OutgoingMessage> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let context_id = self
            .ids
            .context_id
            .get_or_insert_with(new_entry_id)
            .clone();

        self.timeline.append(ConversationEntry::new(
            new_entry_id(),
            EntryRole::Human,
            text,
            capture_timestamp(),
        ));
        self.accumulator.reset();
        self.sending = true;
        self.last_error = None;

        tracing::debug!(context_id = %context_id, task_id = ?self.ids.task_id, "starting turn");
        Some(
            OutgoingMessage::user_text(new_entry_id(), text)
                .with_context_id(Some(context_id))
                .with_task_id(self.ids.task_id.clone()),
        )
    }

    /// Feeds one raw event of the current turn through the reducer.
    pub fn process_event(&mut self, raw: &RawEvent) {
        let Some(event) = classify(raw) else {
            tracing::trace!(kind = ?raw.get("kind"), "skipping unrecognized event");
            return;
        };

        self.ids.observe(&event);
        if let ClassifiedEvent::Status(status) = &event {
            self.status_text.clone_from(&status.state);
        }
        self.accumulator.apply(&event, &mut self.timeline);
    }

    /// Completes the current turn after its stream ended normally.
    pub fn finish_turn(&mut self) {
        self.accumulator.finish_turn(&mut self.timeline);
        self.sending = false;
        tracing::debug!(entries = self.timeline.len(), "turn finished");
    }

    /// Completes the current turn after its stream failed.
    pub fn fail_turn(&mut self, error: &TransportError) {
        tracing::warn!(error = %error, "turn stream failed");
        self.accumulator.fail_turn(&mut self.timeline, error.message());
        self.last_error = Some(error.message().to_string());
        self.sending = false;
    }

    /// Marks an abandoned turn as no longer sending. Entries are left as they are.
    pub fn interrupt_turn(&mut self) {
        if self.sending {
            tracing::debug!("turn interrupted");
        }
        self.sending = false;
    }

    /// Sends `text` and reduces the whole response stream into the timeline.
    ///
    /// Dropping the returned future between events leaves entries in their
    /// last state; call [`ChatSession::interrupt_turn`] afterwards.
    pub async fn send_turn<T>(&mut self, transport: &T, text: &str) -> TurnOutcome
    where
        T: EventTransport + ?Sized,
    {
        let Some(message) = self.begin_turn(text) else {
            return TurnOutcome::Ignored;
        };

        let mut stream = transport.send_message_stream(message);
        while let Some(item) = stream.next().await {
            match item {
                Ok(raw) => self.process_event(&raw),
                Err(error) => {
                    self.fail_turn(&error);
                    return TurnOutcome::Failed(error);
                }
            }
        }

        self.finish_turn();
        TurnOutcome::Completed
    }

    /// Replaces the conversation with a persisted session and replays its events.
    ///
    /// The status text becomes the last replayed `status-update` state, or
    /// [`RESTORED_STATUS`] when there is none.
    pub fn restore(&mut self, record: &SessionRecord) -> RestoreSummary {
        let restored = restore::rebuild(record);

        self.timeline.replace_all(restored.entries);
        self.ids = restored.ids;
        self.accumulator = StreamingAccumulator::new();
        self.status_text = restored
            .status_text
            .unwrap_or_else(|| RESTORED_STATUS.to_string());
        self.last_error = None;
        self.sending = false;

        tracing::debug!(
            session_id = %record.session.session_id,
            persisted = restored.summary.persisted,
            replayed = restored.summary.replayed,
            appended = restored.summary.appended,
            "restored session"
        );
        restored.summary
    }

    /// Starts a new conversation. Listeners stay registered.
    pub fn reset_conversation(&mut self) {
        self.timeline.clear();
        self.accumulator = StreamingAccumulator::new();
        self.ids = ConversationIds::default();
        self.status_text.clear();
        self.last_error = None;
        self.sending = false;
    }
}
