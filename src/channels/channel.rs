//! Channel trait and the inbound message type.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use uuid::Uuid;

use crate::error::ChannelError;
use crate::flow::{Event, OutgoingMessage};

/// What arrived from the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncomingKind {
    /// Typed text or a picked quick-reply value.
    Text(String),
    /// A participant joined the conversation.
    MembersAdded,
}

/// One inbound event, already mapped to a conversation.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// Correlates the log lines of one turn.
    pub id: Uuid,
    /// Name of the channel that produced the message.
    pub channel: String,
    /// Key of the per-conversation state record.
    pub conversation_id: String,
    pub user_id: String,
    pub kind: IncomingKind,
}

impl IncomingMessage {
    /// A text message. The conversation defaults to the user's id.
    pub fn new(channel: &str, user_id: &str, text: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel: channel.to_string(),
            conversation_id: user_id.to_string(),
            user_id: user_id.to_string(),
            kind: IncomingKind::Text(text.to_string()),
        }
    }

    /// A join event for `user_id`.
    pub fn members_added(channel: &str, user_id: &str) -> Self {
        Self {
            kind: IncomingKind::MembersAdded,
            ..Self::new(channel, user_id, "")
        }
    }

    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = conversation_id.into();
        self
    }

    /// The flow event this message feeds into the state machine.
    pub fn event(&self) -> Event {
        match &self.kind {
            IncomingKind::Text(text) => Event::user_message(text.as_str()),
            IncomingKind::MembersAdded => Event::MembersAdded,
        }
    }
}

/// Stream of inbound messages produced by a started channel.
pub type MessageStream = Pin<Box<dyn Stream<Item = IncomingMessage> + Send>>;

/// A push-style transport: produces a stream of messages and accepts the
/// replies to each one.
#[async_trait]
pub trait Channel: Send + Sync {
    fn name(&self) -> &str;

    /// Start listening. The stream ends when the transport closes.
    async fn start(&self) -> Result<MessageStream, ChannelError>;

    /// Deliver the replies produced for `msg`, in order.
    async fn respond(
        &self,
        msg: &IncomingMessage,
        replies: Vec<OutgoingMessage>,
    ) -> Result<(), ChannelError>;

    async fn shutdown(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}
