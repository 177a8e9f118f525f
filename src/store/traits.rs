//! `StateStore` trait: per-conversation state keyed by conversation id.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::OwnedMutexGuard;

use crate::error::StoreError;
use crate::flow::ConversationState;

/// Exclusive hold on one conversation for the duration of a turn.
///
/// Dropping the guard lets the next turn for the same conversation proceed.
pub type ConversationLock = OwnedMutexGuard<()>;

/// Backend-agnostic conversation state store.
///
/// A turn calls `lock`, then `get_or_default`, then `set` or `delete`, all
/// while holding the returned guard. Different conversations never contend.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Wait until no other turn holds this conversation, then take it.
    async fn lock(&self, conversation_id: &str) -> ConversationLock;

    /// Current state, or a fresh MAIN state for unknown conversations.
    async fn get_or_default(&self, conversation_id: &str)
        -> Result<ConversationState, StoreError>;

    /// Replace the stored state and refresh its idle timer.
    async fn set(&self, conversation_id: &str, state: ConversationState)
        -> Result<(), StoreError>;

    /// Forget the conversation. Unknown ids are a no-op.
    async fn delete(&self, conversation_id: &str) -> Result<(), StoreError>;

    /// Drop records untouched for at least `max_idle`. Conversations with a
    /// turn in progress are kept. Returns how many records were removed.
    async fn expire_idle(&self, max_idle: Duration) -> usize;
}
