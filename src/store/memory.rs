//! In-memory conversation state store with idle expiry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use super::traits::{ConversationLock, StateStore};
use crate::error::StoreError;
use crate::flow::ConversationState;

/// How often the background sweep looks for idle conversations.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

struct StoredState {
    state: ConversationState,
    updated_at: Instant,
}

/// Process-local store. State is lost on restart.
#[derive(Default)]
pub struct InMemoryStateStore {
    states: RwLock<HashMap<String, StoredState>>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl InMemoryStateStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of conversations with a stored record.
    pub async fn len(&self) -> usize {
        self.states.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.states.read().await.is_empty()
    }

    fn conversation_mutex(
        locks: &mut HashMap<String, Arc<Mutex<()>>>,
        conversation_id: &str,
    ) -> Arc<Mutex<()>> {
        locks
            .entry(conversation_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn lock(&self, conversation_id: &str) -> ConversationLock {
        let mutex = {
            let mut locks = self.locks.lock().await;
            Self::conversation_mutex(&mut locks, conversation_id)
        };
        mutex.lock_owned().await
    }

    async fn get_or_default(
        &self,
        conversation_id: &str,
    ) -> Result<ConversationState, StoreError> {
        let states = self.states.read().await;
        Ok(states
            .get(conversation_id)
            .map(|stored| stored.state.clone())
            .unwrap_or_default())
    }

    async fn set(
        &self,
        conversation_id: &str,
        state: ConversationState,
    ) -> Result<(), StoreError> {
        debug!(
            conversation_id,
            menu = %state.menu(),
            step = %state.enrollment_step(),
            "Conversation state saved"
        );
        let mut states = self.states.write().await;
        states.insert(
            conversation_id.to_string(),
            StoredState {
                state,
                updated_at: Instant::now(),
            },
        );
        Ok(())
    }

    async fn delete(&self, conversation_id: &str) -> Result<(), StoreError> {
        if self.states.write().await.remove(conversation_id).is_some() {
            debug!(conversation_id, "Conversation state cleared");
        }
        Ok(())
    }

    async fn expire_idle(&self, max_idle: Duration) -> usize {
        // Always locks map first, then states.
        let mut locks = self.locks.lock().await;
        let mut states = self.states.write().await;

        let in_use = |id: &str| locks.get(id).is_some_and(|m| Arc::strong_count(m) > 1);

        let before = states.len();
        states.retain(|id, stored| in_use(id) || stored.updated_at.elapsed() < max_idle);
        let expired = before - states.len();

        // Lock entries nobody holds and with no state behind them are garbage.
        locks.retain(|id, mutex| Arc::strong_count(mutex) > 1 || states.contains_key(id));

        if expired > 0 {
            info!(expired, remaining = states.len(), "Expired idle conversations");
        }
        expired
    }
}

/// Spawn a background task that periodically drops idle conversations.
pub fn spawn_expiry_task(
    store: Arc<dyn StateStore>,
    max_idle: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let period = SWEEP_INTERVAL.min(max_idle).max(Duration::from_secs(1));
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            store.expire_idle(max_idle).await;
        }
    })
}
