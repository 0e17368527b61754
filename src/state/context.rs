//! Conversation context and dialog states
//!
//! One `ConversationContext` per user holds the current dialog state plus the
//! typed scratch data of whichever multi-step flow is in progress. Contexts
//! live in process memory only; a restart puts everyone back at the menu.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::music::MusicKind;

/// The closed set of dialog states. Free text and callback presses are only
/// meaningful relative to the state the user is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogState {
    Menu,
    /// Waiting for the music-service token as free text
    AwaitingToken,
    /// Waiting for the name of a group being created
    AwaitingGroupName,
    /// Waiting for the pick of which group to delete or leave
    AwaitingGroupDeletionChoice,
    /// Waiting for a display name to invite
    AwaitingUsername,
    /// Waiting for the pick of which group the found user joins
    AwaitingGroupForUserAdd,
    /// Waiting for the pick of a liked/found track or album to share
    AwaitingShareTarget,
    /// Waiting for a search query as free text
    AwaitingSearchQuery,
    /// Waiting for the sharer's comment as free text
    AwaitingComment,
    /// Waiting for the pick of a track to rate
    AwaitingRatingTarget,
    /// Stepping through a history list or carousel
    BrowsingHistory,
    /// Unrecoverable failure; only /start or the menu button leaves this state
    Terminal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchMode {
    Track,
    Album,
}

/// A share candidate captured from the provider before the comment step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareCandidate {
    pub catalog_id: i64,
    pub kind: MusicKind,
    pub title: String,
    pub cover_uri: String,
}

/// Scratch data of the share flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareFlow {
    pub group_id: i64,
    pub mode: Option<SearchMode>,
    /// Candidates offered in the last pick view, keyed by catalog id
    pub candidates: Vec<ShareCandidate>,
    /// Set once the user picked; the comment step consumes it
    pub picked: Option<ShareCandidate>,
}

impl ShareFlow {
    pub fn new(group_id: i64) -> Self {
        Self {
            group_id,
            mode: None,
            candidates: Vec::new(),
            picked: None,
        }
    }

    pub fn candidate(&self, catalog_id: i64) -> Option<&ShareCandidate> {
        self.candidates.iter().find(|c| c.catalog_id == catalog_id)
    }
}

/// Scratch data of the rate flow: an order-stable snapshot of the rateable
/// entries taken when the group was picked, plus the current page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateFlow {
    pub group_id: i64,
    pub music_ids: Vec<i64>,
    pub page: usize,
}

/// Scratch data of the add-user flow
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupAdminFlow {
    pub invitee_id: Option<i64>,
    pub invitee_name: Option<String>,
}

/// Scratch data of the history browser: an order-stable snapshot of entry
/// ids captured at entry, never re-queried while navigating
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryFlow {
    pub music_ids: Vec<i64>,
    pub index: usize,
}

impl HistoryFlow {
    pub fn new(music_ids: Vec<i64>) -> Self {
        Self {
            music_ids,
            index: 0,
        }
    }

    /// Move to the requested position, clamped to the snapshot bounds.
    /// No wraparound: stepping past either end stays at that end.
    pub fn seek(&mut self, target: i64) -> usize {
        let last = self.music_ids.len().saturating_sub(1) as i64;
        self.index = target.clamp(0, last) as usize;
        self.index
    }

    pub fn current(&self) -> Option<i64> {
        self.music_ids.get(self.index).copied()
    }
}

/// Which flow's scratch data the context currently carries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FlowData {
    None,
    Share(ShareFlow),
    Rate(RateFlow),
    GroupAdmin(GroupAdminFlow),
    History(HistoryFlow),
}

/// Per-user conversation context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationContext {
    pub user_id: i64,
    pub state: DialogState,
    pub flow: FlowData,
    pub updated_at: DateTime<Utc>,
}

impl ConversationContext {
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            state: DialogState::Menu,
            flow: FlowData::None,
            updated_at: Utc::now(),
        }
    }

    /// Enter a new state, replacing the flow scratch
    pub fn transition(&mut self, state: DialogState, flow: FlowData) {
        self.state = state;
        self.flow = flow;
        self.updated_at = Utc::now();
    }

    /// Return to the menu and drop any flow scratch
    pub fn reset(&mut self) {
        self.transition(DialogState::Menu, FlowData::None);
    }

    pub fn share_flow_mut(&mut self) -> Option<&mut ShareFlow> {
        match &mut self.flow {
            FlowData::Share(flow) => Some(flow),
            _ => None,
        }
    }

    pub fn rate_flow_mut(&mut self) -> Option<&mut RateFlow> {
        match &mut self.flow {
            FlowData::Rate(flow) => Some(flow),
            _ => None,
        }
    }

    pub fn group_admin_flow_mut(&mut self) -> Option<&mut GroupAdminFlow> {
        match &mut self.flow {
            FlowData::GroupAdmin(flow) => Some(flow),
            _ => None,
        }
    }

    pub fn history_flow_mut(&mut self) -> Option<&mut HistoryFlow> {
        match &mut self.flow {
            FlowData::History(flow) => Some(flow),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_context_starts_at_menu() {
        let ctx = ConversationContext::new(1);
        assert_eq!(ctx.state, DialogState::Menu);
        assert!(matches!(ctx.flow, FlowData::None));
    }

    #[test]
    fn reset_drops_flow_scratch() {
        let mut ctx = ConversationContext::new(1);
        ctx.transition(DialogState::AwaitingComment, FlowData::Share(ShareFlow::new(9)));
        ctx.reset();
        assert_eq!(ctx.state, DialogState::Menu);
        assert!(matches!(ctx.flow, FlowData::None));
    }

    #[test]
    fn history_seek_clamps_at_both_ends() {
        let mut flow = HistoryFlow::new(vec![10, 20, 30]);
        assert_eq!(flow.seek(-5), 0);
        assert_eq!(flow.current(), Some(10));
        assert_eq!(flow.seek(99), 2);
        assert_eq!(flow.current(), Some(30));
        assert_eq!(flow.seek(1), 1);
        assert_eq!(flow.current(), Some(20));
    }

    #[test]
    fn empty_history_never_yields_an_entry() {
        let mut flow = HistoryFlow::new(vec![]);
        assert_eq!(flow.seek(3), 0);
        assert_eq!(flow.current(), None);
    }
}
