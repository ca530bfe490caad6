#![allow(unused_imports)]

use buddy_chat::{
    classify, correlate, init_logging, normalize_tool_name, reconcile, ChatSession, ClassifiedEvent,
    ConversationEntry, EntryRole, EnvConfig, RestoreSummary, SessionPicker, StreamingAccumulator, Timeline,
    TimelineChange, ToolCallRecord, ToolStatus, ToolView, TurnOutcome, RESTORED_STATUS,
};

#[test]
fn public_api_exports_compile() {}
