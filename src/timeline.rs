//! Ordered store of conversation entries with change notification.

use std::fmt;

use chat_protocol::ConversationEntry;
use time::OffsetDateTime;
use tokio::sync::mpsc::{self, UnboundedReceiver};

/// One mutation applied to a [`Timeline`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineChange {
    Appended { id: String },
    Updated { id: String },
    /// The entry was moved to the tail.
    Reordered { id: String },
    Replaced { len: usize },
}

/// Change callback; returning false unregisters it.
type Listener = Box<dyn FnMut(&TimelineChange) -> bool + Send>;

/// Generates a fresh entry id.
#[must_use]
pub fn new_entry_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Human-readable capture time (`HH:MM`), local when the offset is known.
#[must_use]
pub fn capture_timestamp() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    format!("{:02}:{:02}", now.hour(), now.minute())
}

#[derive(Default)]
pub struct Timeline {
    entries: Vec<ConversationEntry>,
    listeners: Vec<Listener>,
}

impl fmt::Debug for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timeline")
            .field("entries", &self.entries)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Timeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConversationEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ConversationEntry> {
        self.position(id).map(|index| &self.entries[index])
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    #[must_use]
    pub fn last(&self) -> Option<&ConversationEntry> {
        self.entries.last()
    }

    /// Consumes the store, returning its entries in display order.
    #[must_use]
    pub fn into_entries(self) -> Vec<ConversationEntry> {
        self.entries
    }

    /// Registers a callback invoked after every mutation.
    pub fn subscribe(&mut self, mut listener: impl FnMut(&TimelineChange) + Send + 'static) {
        self.listeners.push(Box::new(move |change| {
            listener(change);
            true
        }));
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Returns a channel receiving every subsequent mutation.
    ///
    /// The sender is dropped from the listener set on the first mutation after
    /// the receiver goes away.
    pub fn changes(&mut self) -> UnboundedReceiver<TimelineChange> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.listeners
            .push(Box::new(move |change| sender.send(change.clone()).is_ok()));
        receiver
    }

    /// Appends `entry` at the tail. Returns false when its id is already present.
    pub fn append(&mut self, entry: ConversationEntry) -> bool {
        if self.contains(&entry.id) {
            tracing::debug!(id = %entry.id, "dropping append with duplicate entry id");
            return false;
        }

        let id = entry.id.clone();
        self.entries.push(entry);
        self.notify(TimelineChange::Appended { id });
        true
    }

    /// Patches the entry with `id` in place. Unknown ids are a silent no-op.
    ///
    /// The entry keeps its id even if the patcher rewrites it.
    pub fn update_by_id(&mut self, id: &str, patch: impl FnOnce(&mut ConversationEntry)) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };

        let entry = &mut self.entries[index];
        patch(entry);
        if entry.id != id {
            entry.id = id.to_string();
        }

        self.notify(TimelineChange::Updated { id: id.to_string() });
        true
    }

    /// Appends `entry`, then moves the entry `assistant_id` to the tail when it
    /// is anywhere else. All other entries keep their relative order.
    pub fn append_keeping_assistant_last(
        &mut self,
        entry: ConversationEntry,
        assistant_id: Option<&str>,
    ) -> bool {
        if !self.append(entry) {
            return false;
        }

        let Some(assistant_id) = assistant_id else {
            return true;
        };
        let Some(index) = self.position(assistant_id) else {
            return true;
        };

        if index + 1 != self.entries.len() {
            let assistant = self.entries.remove(index);
            self.entries.push(assistant);
            self.notify(TimelineChange::Reordered {
                id: assistant_id.to_string(),
            });
        }

        true
    }

    /// Replaces the whole timeline, dropping later duplicates of any id.
    pub fn replace_all(&mut self, entries: Vec<ConversationEntry>) {
        let mut deduped: Vec<ConversationEntry> = Vec::with_capacity(entries.len());
        for entry in entries {
            if deduped.iter().any(|existing| existing.id == entry.id) {
                tracing::debug!(id = %entry.id, "dropping duplicate id while replacing timeline");
                continue;
            }
            deduped.push(entry);
        }

        self.entries = deduped;
        self.notify(TimelineChange::Replaced {
            len: self.entries.len(),
        });
    }

    pub fn clear(&mut self) {
        self.replace_all(Vec::new());
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }

    fn notify(&mut self, change: TimelineChange) {
        self.listeners.retain_mut(|listener| listener(&change));
    }
}
