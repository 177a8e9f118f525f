//! Conversation state storage.

pub mod memory;
pub mod traits;

pub use memory::{spawn_expiry_task, InMemoryStateStore};
pub use traits::{ConversationLock, StateStore};
