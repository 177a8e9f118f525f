//! Channel manager: starts every registered channel and routes replies back.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{error, info, warn};

use crate::channels::{Channel, IncomingMessage, MessageStream};
use crate::dispatcher::TurnDispatcher;
use crate::error::ChannelError;
use crate::flow::OutgoingMessage;

#[derive(Default)]
pub struct ChannelManager {
    channels: Vec<Arc<dyn Channel>>,
}

impl ChannelManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, channel: Arc<dyn Channel>) {
        info!(channel = channel.name(), "Channel registered");
        self.channels.push(channel);
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    /// Start all channels and merge their streams.
    pub async fn start_all(&self) -> Result<MessageStream, ChannelError> {
        let mut streams = Vec::with_capacity(self.channels.len());
        for channel in &self.channels {
            streams.push(channel.start().await?);
        }
        Ok(Box::pin(futures::stream::select_all(streams)))
    }

    /// Hand replies to the channel the message came from.
    pub async fn respond(
        &self,
        msg: &IncomingMessage,
        replies: Vec<OutgoingMessage>,
    ) -> Result<(), ChannelError> {
        let channel = self
            .channels
            .iter()
            .find(|c| c.name() == msg.channel)
            .ok_or_else(|| ChannelError::SendFailed {
                name: msg.channel.clone(),
                reason: "channel not registered".into(),
            })?;
        channel.respond(msg, replies).await
    }

    /// Feed every inbound message through the dispatcher until all streams
    /// end or the process is interrupted. Messages are handled in arrival
    /// order.
    pub async fn run(&self, dispatcher: Arc<TurnDispatcher>) -> Result<(), ChannelError> {
        let mut messages = self.start_all().await?;
        info!(channels = ?self.names(), "Channels listening");

        loop {
            let message = tokio::select! {
                biased;
                _ = tokio::signal::ctrl_c() => {
                    info!("Ctrl+C received, shutting down channels...");
                    break;
                }
                msg = messages.next() => match msg {
                    Some(m) => m,
                    None => {
                        info!("All channel streams ended");
                        break;
                    }
                },
            };

            let replies = dispatcher.handle(&message).await;
            if let Err(e) = self.respond(&message, replies).await {
                error!(channel = %message.channel, error = %e, "Failed to deliver replies");
            }
        }

        self.shutdown_all().await
    }

    pub async fn shutdown_all(&self) -> Result<(), ChannelError> {
        for channel in &self.channels {
            if let Err(e) = channel.shutdown().await {
                warn!(channel = channel.name(), error = %e, "Channel shutdown failed");
            }
        }
        Ok(())
    }
}
