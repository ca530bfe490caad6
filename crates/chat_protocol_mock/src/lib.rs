//! Deterministic test doubles for the shared `chat_protocol` contract.
//!
//! This crate contains no transport/protocol logic and is intended for local
//! development and contract-level integration testing.

pub mod events;

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use chat_protocol::{
    EventStream, EventTransport, OutgoingMessage, RawEvent, SessionRecord, SessionSource,
    SessionSourceError, SessionSummary, TransportError,
};
use futures_util::stream;

/// One step of a scripted turn.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    Event(RawEvent),
    Fail(String),
}

/// Transport that answers each sent message with the next scripted turn.
///
/// A turn with no remaining script yields an empty stream.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    turns: Mutex<VecDeque<Vec<ScriptStep>>>,
    sent: Mutex<Vec<OutgoingMessage>>,
}

impl ScriptedTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues one turn consisting only of events.
    #[must_use]
    pub fn with_turn(self, events: Vec<RawEvent>) -> Self {
        self.push_turn(events.into_iter().map(ScriptStep::Event).collect());
        self
    }

    /// Queues one turn with explicit steps, including failures.
    #[must_use]
    pub fn with_steps(self, steps: Vec<ScriptStep>) -> Self {
        self.push_turn(steps);
        self
    }

    pub fn push_turn(&self, steps: Vec<ScriptStep>) {
        lock_unpoisoned(&self.turns).push_back(steps);
    }

    /// Returns every message sent so far, in order.
    #[must_use]
    pub fn sent_messages(&self) -> Vec<OutgoingMessage> {
        lock_unpoisoned(&self.sent).clone()
    }

    #[must_use]
    pub fn remaining_turns(&self) -> usize {
        lock_unpoisoned(&self.turns).len()
    }
}

impl EventTransport for ScriptedTransport {
    fn send_message_stream(&self, message: OutgoingMessage) -> EventStream<'_> {
        lock_unpoisoned(&self.sent).push(message);
        let steps = lock_unpoisoned(&self.turns).pop_front().unwrap_or_default();

        // A failure ends the stream, mirroring a transport that throws mid-turn.
        let mut items = Vec::with_capacity(steps.len());
        for step in steps {
            match step {
                ScriptStep::Event(event) => items.push(Ok(event)),
                ScriptStep::Fail(message) => {
                    items.push(Err(TransportError::new(message)));
                    break;
                }
            }
        }

        Box::pin(stream::iter(items))
    }
}

/// In-memory session history.
#[derive(Debug, Default)]
pub struct MemorySessionSource {
    records: Vec<SessionRecord>,
    failure: Option<String>,
    fetched: Mutex<HashMap<String, usize>>,
}

impl MemorySessionSource {
    #[must_use]
    pub fn new(records: Vec<SessionRecord>) -> Self {
        Self {
            records,
            failure: None,
            fetched: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a source whose every call fails with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            records: Vec::new(),
            failure: Some(message.into()),
            fetched: Mutex::new(HashMap::new()),
        }
    }

    /// Returns how many times `session_id` was fetched.
    #[must_use]
    pub fn fetch_count(&self, session_id: &str) -> usize {
        lock_unpoisoned(&self.fetched)
            .get(session_id)
            .copied()
            .unwrap_or(0)
    }

    fn check_failure(&self) -> Result<(), SessionSourceError> {
        match &self.failure {
            Some(message) => Err(SessionSourceError::unavailable(message.clone())),
            None => Ok(()),
        }
    }
}

impl SessionSource for MemorySessionSource {
    async fn list_sessions(&self, limit: usize) -> Result<Vec<SessionSummary>, SessionSourceError> {
        self.check_failure()?;

        let mut summaries: Vec<SessionSummary> = self
            .records
            .iter()
            .map(|record| record.session.clone())
            .collect();
        summaries.sort_by(|left, right| right.updated_at.cmp(&left.updated_at));
        summaries.truncate(limit);
        Ok(summaries)
    }

    async fn fetch_session(&self, session_id: &str) -> Result<SessionRecord, SessionSourceError> {
        self.check_failure()?;
        *lock_unpoisoned(&self.fetched)
            .entry(session_id.to_string())
            .or_default() += 1;

        self.records
            .iter()
            .find(|record| record.session.session_id == session_id)
            .cloned()
            .ok_or_else(|| SessionSourceError::NotFound {
                session_id: session_id.to_string(),
            })
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
