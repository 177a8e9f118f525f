//! CLI channel: stdin/stdout REPL for local testing.
//!
//! Quick-reply options are printed as a numbered list; typing the number
//! sends the option's value.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;

use crate::channels::{Channel, IncomingMessage, MessageStream};
use crate::error::ChannelError;
use crate::flow::{OutgoingMessage, SuggestedAction};

const CLI_USER: &str = "local-user";

/// A simple CLI channel that reads from stdin and writes to stdout.
pub struct CliChannel {
    /// Options of the last reply, for numeric selection.
    options: Arc<Mutex<Vec<SuggestedAction>>>,
}

impl CliChannel {
    pub fn new() -> Self {
        Self {
            options: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Default for CliChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a typed line to the text sent to the bot: a valid option number
/// becomes that option's value.
fn resolve_input(line: &str, options: &[SuggestedAction]) -> String {
    line.parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| options.get(i))
        .map(|option| option.value.clone())
        .unwrap_or_else(|| line.to_string())
}

/// Plain-text rendering of one reply.
fn render(reply: &OutgoingMessage) -> String {
    let mut out = reply.text.clone();
    for (i, option) in reply.suggested_actions.iter().enumerate() {
        out.push_str(&format!("\n  {}. {}", i + 1, option.title));
    }
    out
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    async fn start(&self) -> Result<MessageStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let options = self.options.clone();

        // Greet as if the local user just joined.
        tx.send(IncomingMessage::members_added("cli", CLI_USER))
            .map_err(|e| ChannelError::SendFailed {
                name: "cli".to_string(),
                reason: format!("greeting not queued: {e}"),
            })?;

        tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            let reader = BufReader::new(stdin);
            let mut lines = reader.lines();

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim().to_string();
                        if line.is_empty() {
                            eprint!("> ");
                            continue;
                        }
                        let text = resolve_input(&line, &options.lock().await);
                        let msg = IncomingMessage::new("cli", CLI_USER, &text);
                        if tx.send(msg).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF
                    Err(e) => {
                        tracing::error!("Error reading stdin: {}", e);
                        break;
                    }
                }
            }
        });

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|msg| (msg, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn respond(
        &self,
        _msg: &IncomingMessage,
        replies: Vec<OutgoingMessage>,
    ) -> Result<(), ChannelError> {
        for reply in &replies {
            println!("\n{}", render(reply));
        }
        if let Some(last) = replies.iter().rev().find(|r| !r.suggested_actions.is_empty()) {
            *self.options.lock().await = last.suggested_actions.clone();
        } else if !replies.is_empty() {
            self.options.lock().await.clear();
        }
        eprint!("\n> ");
        Ok(())
    }
}
