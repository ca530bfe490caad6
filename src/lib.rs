//! Streaming conversation reducer for A2A chat clients.
//!
//! Invariant: a timeline is only mutated through [`Timeline`] methods, so every
//! change reaches its listeners.
//!
//! # Public API Overview
//! - Drive turns through an explicitly owned [`ChatSession`] with any
//!   [`chat_protocol::EventTransport`].
//! - Observe the conversation via [`ChatSession::timeline`] and the
//!   [`TimelineChange`] notifications.
//! - Restore persisted history with [`ChatSession::restore`] or through a
//!   [`SessionPicker`] backed by any [`chat_protocol::SessionSource`].
//! - Classify raw events and select tool display variants without a session
//!   using [`classify`] and [`ToolView`].

pub mod accumulator;
pub mod classifier;
pub mod config;
pub mod logging;
pub mod restore;
pub mod session;
pub mod timeline;
pub mod tool_call;

pub use crate::accumulator::StreamingAccumulator;
pub use crate::classifier::{classify, ClassifiedEvent};
pub use crate::config::EnvConfig;
pub use crate::logging::init_logging;
pub use crate::restore::{reconcile, RestoreSummary, SessionPicker};
pub use crate::session::{ChatSession, TurnOutcome, RESTORED_STATUS};
pub use crate::timeline::{Timeline, TimelineChange};
pub use crate::tool_call::{correlate, normalize_tool_name, ToolCallRecord, ToolView};

pub use chat_protocol::{ConversationEntry, EntryRole, ToolStatus};
