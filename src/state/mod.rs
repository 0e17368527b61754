//! Conversation state management

pub mod context;
pub mod storage;

pub use context::{
    ConversationContext, DialogState, FlowData, GroupAdminFlow, HistoryFlow, RateFlow,
    SearchMode, ShareCandidate, ShareFlow,
};
pub use storage::StateStorage;
