//! Events fed into the conversation state machine.

use serde::{Deserialize, Serialize};

/// Input to a single transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A participant joined; greet without consuming any input.
    MembersAdded,
    /// Free text typed (or a quick-reply value picked) by the user.
    UserMessage { text: String },
    /// The enrollment submission started by a previous transition resolved.
    SubmissionCompleted { outcome: SubmissionOutcome },
}

impl Event {
    pub fn user_message(text: impl Into<String>) -> Self {
        Self::UserMessage { text: text.into() }
    }
}

/// How the enrollment submission ended, as far as the conversation cares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    /// The backend stored the record, optionally returning its identifier.
    Accepted { id: Option<String> },
    /// Non-2xx response, transport failure or timeout.
    Failed,
}

/// Menu commands recognized ahead of any FAQ lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    StartEnrollment,
    OpenFaq,
    Back,
}

impl Command {
    /// Classify already-normalized text as a menu command.
    pub fn parse(normalized: &str) -> Option<Command> {
        match normalized {
            "realizar matrícula" | "realizar matricula" => Some(Command::StartEnrollment),
            "perguntas frequentes" => Some(Command::OpenFaq),
            "voltar" => Some(Command::Back),
            _ => None,
        }
    }
}

/// Lower-case and trim, the single normalization used for menu choices and
/// FAQ keys.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}
