//! Turn dispatcher: runs one turn per inbound message.
//!
//! lock → load → transition → run effects → save. The only await outside
//! the store is the submission call, which is bounded by a timeout and
//! bracketed by two persisted states: `Submitting` before the call, the
//! post-submission state after it.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::channels::IncomingMessage;
use crate::error::{Error, SubmitError};
use crate::flow::{
    self, messages, ConversationState, Effect, EnrollmentRecord, Event, FlowContext,
    OutgoingMessage, SubmissionOutcome, TransitionResult,
};
use crate::store::StateStore;
use crate::submitter::EnrollmentSubmitter;

pub struct TurnDispatcher {
    store: Arc<dyn StateStore>,
    submitter: Arc<dyn EnrollmentSubmitter>,
    context: FlowContext,
    submit_timeout: Duration,
}

impl TurnDispatcher {
    pub fn new(
        store: Arc<dyn StateStore>,
        submitter: Arc<dyn EnrollmentSubmitter>,
        context: FlowContext,
        submit_timeout: Duration,
    ) -> Self {
        Self {
            store,
            submitter,
            context,
            submit_timeout,
        }
    }

    /// Process one message and return the replies, in order.
    ///
    /// Never fails: an internal error is turned into a generic apology and
    /// the conversation's state is dropped so it cannot stay stuck.
    pub async fn handle(&self, message: &IncomingMessage) -> Vec<OutgoingMessage> {
        let conversation_id = message.conversation_id.as_str();
        let _turn = self.store.lock(conversation_id).await;

        match self.run_turn(message).await {
            Ok(replies) => replies,
            Err(e) => {
                error!(
                    conversation_id,
                    message_id = %message.id,
                    channel = %message.channel,
                    error = %e,
                    "Turn failed"
                );
                if let Err(e) = self.store.delete(conversation_id).await {
                    warn!(conversation_id, error = %e, "Failed to clear state after turn error");
                }
                vec![OutgoingMessage::text(messages::INTERNAL_ERROR)]
            }
        }
    }

    async fn run_turn(&self, message: &IncomingMessage) -> Result<Vec<OutgoingMessage>, Error> {
        let conversation_id = message.conversation_id.as_str();
        let mut state = self.store.get_or_default(conversation_id).await?;
        let mut event = message.event();
        let mut replies = Vec::new();

        loop {
            let from = (state.menu(), state.enrollment_step());
            let TransitionResult { new_state, effects } =
                flow::transition(&state, &self.context, event)?;

            let mut submission: Option<EnrollmentRecord> = None;
            let mut clear = false;
            for effect in effects {
                match effect {
                    Effect::Send(reply) => replies.push(reply),
                    Effect::Submit(record) => submission = Some(record),
                    Effect::ClearState => clear = true,
                }
            }

            info!(
                conversation_id,
                message_id = %message.id,
                from_menu = %from.0,
                from_step = %from.1,
                menu = %new_state.menu(),
                step = %new_state.enrollment_step(),
                "Turn transition"
            );

            self.save(conversation_id, &new_state, clear).await?;

            let Some(record) = submission else {
                break;
            };
            let outcome = self.submit(conversation_id, &record).await;
            state = new_state;
            event = Event::SubmissionCompleted { outcome };
        }

        Ok(replies)
    }

    /// MAIN is the default, so a reset needs no record.
    async fn save(
        &self,
        conversation_id: &str,
        state: &ConversationState,
        clear: bool,
    ) -> Result<(), Error> {
        if clear || state.is_reset() {
            self.store.delete(conversation_id).await?;
        } else {
            self.store.set(conversation_id, state.clone()).await?;
        }
        Ok(())
    }

    async fn submit(&self, conversation_id: &str, record: &EnrollmentRecord) -> SubmissionOutcome {
        debug!(
            conversation_id,
            nome = %record.name,
            email = %record.email,
            curso = %record.course,
            "Submitting enrollment"
        );

        let result =
            match tokio::time::timeout(self.submit_timeout, self.submitter.submit(record)).await {
                Ok(result) => result,
                Err(_) => Err(SubmitError::Timeout(self.submit_timeout)),
            };

        match result {
            Ok(receipt) => {
                info!(conversation_id, id = ?receipt.id, "Enrollment submitted");
                SubmissionOutcome::Accepted { id: receipt.id }
            }
            Err(e) => {
                warn!(conversation_id, error = %e, "Enrollment submission failed; data discarded");
                SubmissionOutcome::Failed
            }
        }
    }
}
