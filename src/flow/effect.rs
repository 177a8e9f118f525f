//! Effects produced by state transitions.

use super::messages::OutgoingMessage;
use super::state::EnrollmentRecord;

/// Effects to be executed by the dispatcher after a transition, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Relay a message to the user.
    Send(OutgoingMessage),

    /// Hand the collected record to the enrollment submitter.
    Submit(EnrollmentRecord),

    /// Drop the conversation's state record (flow completed or reset).
    ClearState,
}

impl Effect {
    pub fn send_text(text: impl Into<String>) -> Self {
        Effect::Send(OutgoingMessage::text(text))
    }
}
