//! In-process conversation state storage
//!
//! Contexts are keyed by user id in a shared map. Nothing here survives a
//! restart; every user simply lands back at the menu.

use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::state::context::ConversationContext;

#[derive(Debug, Default)]
pub struct StateStorage {
    contexts: RwLock<HashMap<i64, ConversationContext>>,
}

impl StateStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a user's context, creating a fresh menu context on first touch
    pub async fn load(&self, user_id: i64) -> ConversationContext {
        if let Some(ctx) = self.contexts.read().await.get(&user_id) {
            return ctx.clone();
        }

        let ctx = ConversationContext::new(user_id);
        self.contexts.write().await.insert(user_id, ctx.clone());
        ctx
    }

    /// Persist a context after a transition
    pub async fn save(&self, ctx: ConversationContext) {
        self.contexts.write().await.insert(ctx.user_id, ctx);
    }

    /// Drop a user's context entirely
    pub async fn delete(&self, user_id: i64) {
        self.contexts.write().await.remove(&user_id);
    }

    pub async fn len(&self) -> usize {
        self.contexts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.contexts.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::context::{DialogState, FlowData};

    #[tokio::test]
    async fn load_creates_menu_context_on_first_touch() {
        let storage = StateStorage::new();
        let ctx = storage.load(42).await;
        assert_eq!(ctx.state, DialogState::Menu);
        assert_eq!(storage.len().await, 1);
    }

    #[tokio::test]
    async fn save_overwrites_previous_context() {
        let storage = StateStorage::new();
        let mut ctx = storage.load(42).await;
        ctx.transition(DialogState::AwaitingToken, FlowData::None);
        storage.save(ctx).await;

        let reloaded = storage.load(42).await;
        assert_eq!(reloaded.state, DialogState::AwaitingToken);
    }

    #[tokio::test]
    async fn delete_forgets_the_user() {
        let storage = StateStorage::new();
        storage.load(42).await;
        storage.delete(42).await;
        assert!(storage.is_empty().await);
    }
}
