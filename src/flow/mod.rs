//! Conversation flow engine.
//!
//! A pure state machine: `transition(state, context, event)` returns the next
//! state and the effects to run. Persistence, locking and the submission
//! call live in the dispatcher.

pub mod effect;
pub mod event;
pub mod messages;
pub mod state;
pub mod transition;
pub mod validation;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::{normalize, Command, Event, SubmissionOutcome};
pub use messages::{OutgoingMessage, SuggestedAction};
pub use state::{ConversationState, EnrollmentRecord, EnrollmentStep, MenuMode};
pub use transition::{transition, FlowContext, TransitionError, TransitionResult};
pub use validation::is_valid_email;
