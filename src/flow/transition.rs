//! Pure state transition function.
//!
//! Given the current state and one event, decide the next state and the
//! effects the dispatcher must run. No I/O happens here.

use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use super::effect::Effect;
use super::event::{normalize, Command, Event, SubmissionOutcome};
use super::messages::{self as msg, OutgoingMessage};
use super::state::{ConversationState, EnrollmentRecord};
use super::validation::is_valid_email;
use crate::faq::FaqStore;

/// Read-only inputs shared by every transition.
#[derive(Debug, Clone)]
pub struct FlowContext {
    pub faq: Arc<FaqStore>,
    /// Review the collected data and wait for "sim" before submitting.
    pub confirm_before_submit: bool,
}

impl FlowContext {
    pub fn new(faq: Arc<FaqStore>) -> Self {
        Self {
            faq,
            confirm_before_submit: false,
        }
    }

    pub fn with_confirmation(mut self, enabled: bool) -> Self {
        self.confirm_before_submit = enabled;
        self
    }
}

/// Result of a state transition.
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ConversationState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConversationState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_message(self, message: OutgoingMessage) -> Self {
        self.with_effect(Effect::Send(message))
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_effect(Effect::send_text(text))
    }

    /// Messages to relay, in order.
    pub fn messages(&self) -> impl Iterator<Item = &OutgoingMessage> {
        self.effects.iter().filter_map(|effect| match effect {
            Effect::Send(message) => Some(message),
            _ => None,
        })
    }

    /// The record to submit, if this transition completed the collection.
    pub fn submission(&self) -> Option<&EnrollmentRecord> {
        self.effects.iter().find_map(|effect| match effect {
            Effect::Submit(record) => Some(record),
            _ => None,
        })
    }

    pub fn clears_state(&self) -> bool {
        self.effects.iter().any(|effect| matches!(effect, Effect::ClearState))
    }
}

/// Errors that can occur during transition.
#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("No submission is in flight (state: {state})")]
    NoSubmissionInFlight { state: String },
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function.
pub fn transition(
    state: &ConversationState,
    context: &FlowContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    let reset = ConversationState::Main;
    let mut from = state;
    let result = match (state, event) {
        // Greeting never consumes input or touches collected data.
        (_, Event::MembersAdded) => {
            TransitionResult::new(state.clone()).with_message(msg::main_menu(msg::WELCOME))
        }

        (ConversationState::Main, Event::UserMessage { text }) => on_main(context, &text),

        (ConversationState::Faq, Event::UserMessage { text }) => on_faq(context, &text),

        (ConversationState::AskingName, Event::UserMessage { text }) => {
            let name = text.trim();
            if name.is_empty() {
                TransitionResult::new(ConversationState::AskingName).with_text(msg::ASK_NAME_AGAIN)
            } else {
                TransitionResult::new(ConversationState::AskingEmail {
                    name: name.to_string(),
                })
                .with_text(msg::thanks_ask_email(name))
            }
        }

        (ConversationState::AskingEmail { name }, Event::UserMessage { text }) => {
            let email = text.trim();
            if is_valid_email(email) {
                TransitionResult::new(ConversationState::AskingCourse {
                    name: name.clone(),
                    email: email.to_string(),
                })
                .with_text(msg::ASK_COURSE)
            } else {
                TransitionResult::new(state.clone()).with_text(msg::INVALID_EMAIL)
            }
        }

        (ConversationState::AskingCourse { name, email }, Event::UserMessage { text }) => {
            let course = text.trim();
            if course.is_empty() {
                TransitionResult::new(state.clone()).with_text(msg::ASK_COURSE_AGAIN)
            } else {
                let record = EnrollmentRecord::new(name.clone(), email.clone(), course);
                if context.confirm_before_submit {
                    let prompt = msg::confirm_prompt(&record);
                    TransitionResult::new(ConversationState::Confirming { record })
                        .with_message(prompt)
                } else {
                    begin_submission(record)
                }
            }
        }

        (ConversationState::Confirming { record }, Event::UserMessage { text }) => {
            if normalize(&text) == "sim" {
                begin_submission(record.clone())
            } else {
                TransitionResult::new(ConversationState::Main)
                    .with_message(msg::main_menu(msg::CANCELLED))
                    .with_effect(Effect::ClearState)
            }
        }

        // A previous turn was interrupted mid-submission: the record is gone,
        // the conversation restarts from MAIN with this input.
        (ConversationState::Submitting { .. }, Event::UserMessage { text }) => {
            warn!("Found a conversation stuck in submission; resetting to main menu");
            from = &reset;
            on_main(context, &text)
        }

        (ConversationState::Submitting { record }, Event::SubmissionCompleted { outcome }) => {
            let summary = match outcome {
                SubmissionOutcome::Accepted { id } => msg::success_summary(record, id.as_deref()),
                SubmissionOutcome::Failed => msg::SUBMISSION_FAILED.to_string(),
            };
            TransitionResult::new(ConversationState::Main)
                .with_text(summary)
                .with_message(msg::main_menu(msg::AT_YOUR_SERVICE))
                .with_effect(Effect::ClearState)
        }

        (other, Event::SubmissionCompleted { .. }) => {
            return Err(TransitionError::NoSubmissionInFlight {
                state: format!("{}/{}", other.menu(), other.enrollment_step()),
            });
        }
    };

    check_step_order(from, &result.new_state)?;
    Ok(result)
}

fn on_main(context: &FlowContext, text: &str) -> TransitionResult {
    let input = normalize(text);
    match Command::parse(&input) {
        Some(Command::StartEnrollment) => {
            TransitionResult::new(ConversationState::AskingName).with_text(msg::ASK_NAME)
        }
        Some(Command::OpenFaq) => TransitionResult::new(ConversationState::Faq)
            .with_message(msg::faq_menu(msg::FAQ_PICK, &context.faq)),
        // "voltar" means nothing at MAIN; it falls through to the FAQ lookup.
        Some(Command::Back) | None => match context.faq.lookup(&input) {
            Some(answer) => TransitionResult::new(ConversationState::Main)
                .with_text(answer)
                .with_message(msg::main_menu(msg::ANYTHING_ELSE)),
            None => TransitionResult::new(ConversationState::Main)
                .with_message(msg::main_menu(msg::NOT_UNDERSTOOD)),
        },
    }
}

fn on_faq(context: &FlowContext, text: &str) -> TransitionResult {
    let input = normalize(text);
    if Command::parse(&input) == Some(Command::Back) {
        return TransitionResult::new(ConversationState::Main)
            .with_message(msg::main_menu(msg::BACK_TO_MAIN));
    }
    match context.faq.lookup(&input) {
        Some(answer) => TransitionResult::new(ConversationState::Faq)
            .with_text(answer)
            .with_message(msg::faq_menu(msg::FAQ_ANOTHER, &context.faq)),
        None => TransitionResult::new(ConversationState::Faq)
            .with_message(msg::faq_menu(msg::FAQ_NOT_FOUND, &context.faq)),
    }
}

fn begin_submission(record: EnrollmentRecord) -> TransitionResult {
    TransitionResult::new(ConversationState::Submitting {
        record: record.clone(),
    })
    .with_effect(Effect::Submit(record))
}

/// Enrollment steps only move forward one at a time, or back to NONE.
fn check_step_order(
    from: &ConversationState,
    to: &ConversationState,
) -> Result<(), TransitionError> {
    let (from, to) = (from.enrollment_step(), to.enrollment_step());
    if from == to || from.can_transition_to(to) {
        Ok(())
    } else {
        Err(TransitionError::InvalidTransition(format!(
            "enrollment step {from} cannot move to {to}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::state::{EnrollmentStep, MenuMode};

    fn faq() -> Arc<FaqStore> {
        Arc::new(FaqStore::from_pairs([
            ("como emitir boleto?", "Acesse o portal do aluno e clique em 'Financeiro'."),
            ("secretaria", "Você pode contatar a secretaria em secretaria@exemplo.edu."),
        ]))
    }

    fn context() -> FlowContext {
        FlowContext::new(faq())
    }

    fn send(state: &ConversationState, ctx: &FlowContext, text: &str) -> TransitionResult {
        transition(state, ctx, Event::user_message(text)).unwrap()
    }

    fn texts(result: &TransitionResult) -> Vec<&str> {
        result.messages().map(|m| m.text.as_str()).collect()
    }

    fn asking_course() -> ConversationState {
        ConversationState::AskingCourse {
            name: "Ana Souza".into(),
            email: "ana@exemplo.com".into(),
        }
    }

    // ── Greeting ────────────────────────────────────────────────────

    #[test]
    fn members_added_shows_main_menu() {
        let result = transition(&ConversationState::Main, &context(), Event::MembersAdded).unwrap();
        assert_eq!(result.new_state, ConversationState::Main);
        let messages: Vec<_> = result.messages().collect();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, msg::WELCOME);
        assert_eq!(messages[0].suggested_actions, msg::main_menu_actions());
        assert!(result.submission().is_none());
    }

    #[test]
    fn members_added_keeps_collected_data() {
        let state = asking_course();
        let result = transition(&state, &context(), Event::MembersAdded).unwrap();
        assert_eq!(result.new_state, state);
    }

    // ── Main menu ───────────────────────────────────────────────────

    #[test]
    fn main_start_enrollment() {
        let result = send(&ConversationState::Main, &context(), "  Realizar Matrícula ");
        assert_eq!(result.new_state, ConversationState::AskingName);
        assert_eq!(texts(&result), vec![msg::ASK_NAME]);
    }

    #[test]
    fn main_open_faq_menu() {
        let result = send(&ConversationState::Main, &context(), "perguntas frequentes");
        assert_eq!(result.new_state, ConversationState::Faq);
        let menu = result.messages().next().unwrap();
        assert_eq!(menu.text, msg::FAQ_PICK);
        assert_eq!(menu.suggested_actions.len(), 3);
        assert_eq!(menu.suggested_actions[2].value, "voltar");
    }

    #[test]
    fn main_direct_faq_answer_stays_main() {
        let result = send(&ConversationState::Main, &context(), "Como emitir boleto?");
        assert_eq!(result.new_state, ConversationState::Main);
        let texts = texts(&result);
        assert_eq!(texts[0], "Acesse o portal do aluno e clique em 'Financeiro'.");
        assert_eq!(texts[1], msg::ANYTHING_ELSE);
    }

    #[test]
    fn main_unrecognized_reshows_menu() {
        let result = send(&ConversationState::Main, &context(), "bom dia");
        assert_eq!(result.new_state, ConversationState::Main);
        let reply = result.messages().next().unwrap();
        assert_eq!(reply.text, msg::NOT_UNDERSTOOD);
        assert_eq!(reply.suggested_actions, msg::main_menu_actions());
    }

    #[test]
    fn voltar_at_main_is_unrecognized() {
        let result = send(&ConversationState::Main, &context(), "voltar");
        assert_eq!(result.new_state, ConversationState::Main);
        assert_eq!(texts(&result), vec![msg::NOT_UNDERSTOOD]);
    }

    #[test]
    fn menu_command_shadows_colliding_faq_question() {
        let ctx = FlowContext::new(Arc::new(FaqStore::from_pairs([(
            "realizar matrícula",
            "Resposta inalcançável",
        )])));
        let result = send(&ConversationState::Main, &ctx, "realizar matrícula");
        assert_eq!(result.new_state, ConversationState::AskingName);
    }

    // ── FAQ menu ────────────────────────────────────────────────────

    #[test]
    fn faq_back_returns_to_main() {
        let result = send(&ConversationState::Faq, &context(), "Voltar");
        assert_eq!(result.new_state, ConversationState::Main);
        let reply = result.messages().next().unwrap();
        assert_eq!(reply.text, msg::BACK_TO_MAIN);
        assert_eq!(reply.suggested_actions, msg::main_menu_actions());
    }

    #[test]
    fn faq_answer_reshows_faq_menu() {
        let result = send(&ConversationState::Faq, &context(), "secretaria");
        assert_eq!(result.new_state, ConversationState::Faq);
        let texts = texts(&result);
        assert!(texts[0].contains("secretaria@exemplo.edu"));
        assert_eq!(texts[1], msg::FAQ_ANOTHER);
    }

    #[test]
    fn faq_miss_reshows_faq_menu() {
        let result = send(&ConversationState::Faq, &context(), "onde fica a biblioteca?");
        assert_eq!(result.new_state, ConversationState::Faq);
        assert_eq!(texts(&result), vec![msg::FAQ_NOT_FOUND]);
    }

    #[test]
    fn faq_mode_with_empty_store_reports_not_found() {
        let ctx = FlowContext::new(Arc::new(FaqStore::empty()));
        let result = send(&ConversationState::Faq, &ctx, "secretaria");
        assert_eq!(result.new_state, ConversationState::Faq);
        assert_eq!(texts(&result), vec![msg::FAQ_NOT_FOUND]);
    }

    // ── Enrollment steps ────────────────────────────────────────────

    #[test]
    fn name_is_stored_trimmed() {
        let result = send(&ConversationState::AskingName, &context(), "  Ana Souza ");
        assert_eq!(
            result.new_state,
            ConversationState::AskingEmail { name: "Ana Souza".into() }
        );
        assert_eq!(texts(&result), vec![msg::thanks_ask_email("Ana Souza")]);
    }

    #[test]
    fn blank_name_reprompts() {
        let result = send(&ConversationState::AskingName, &context(), "   ");
        assert_eq!(result.new_state, ConversationState::AskingName);
        assert_eq!(texts(&result), vec![msg::ASK_NAME_AGAIN]);
    }

    #[test]
    fn menu_words_are_accepted_as_a_name() {
        let result = send(&ConversationState::AskingName, &context(), "voltar");
        assert_eq!(result.new_state.name(), Some("voltar"));
    }

    #[test]
    fn invalid_email_keeps_step_and_name() {
        let state = ConversationState::AskingEmail { name: "Ana Souza".into() };
        let result = send(&state, &context(), "not-an-email");
        assert_eq!(result.new_state, state);
        assert_eq!(result.new_state.enrollment_step(), EnrollmentStep::AskEmail);
        assert_eq!(texts(&result), vec![msg::INVALID_EMAIL]);
    }

    #[test]
    fn valid_email_advances() {
        let state = ConversationState::AskingEmail { name: "Ana Souza".into() };
        let result = send(&state, &context(), " ana@exemplo.com ");
        assert_eq!(result.new_state, asking_course());
        assert_eq!(texts(&result), vec![msg::ASK_COURSE]);
    }

    #[test]
    fn course_triggers_submission_without_confirmation() {
        let result = send(&asking_course(), &context(), "Direito");
        let record = EnrollmentRecord::new("Ana Souza", "ana@exemplo.com", "Direito");
        assert_eq!(
            result.new_state,
            ConversationState::Submitting { record: record.clone() }
        );
        assert_eq!(result.submission(), Some(&record));
        assert_eq!(result.messages().count(), 0);
    }

    #[test]
    fn blank_course_reprompts() {
        let result = send(&asking_course(), &context(), "");
        assert_eq!(result.new_state, asking_course());
        assert!(result.submission().is_none());
        assert_eq!(texts(&result), vec![msg::ASK_COURSE_AGAIN]);
    }

    // ── Confirmation variant ────────────────────────────────────────

    #[test]
    fn course_asks_for_confirmation_when_enabled() {
        let ctx = context().with_confirmation(true);
        let result = send(&asking_course(), &ctx, "Direito");
        assert!(matches!(result.new_state, ConversationState::Confirming { .. }));
        assert_eq!(result.new_state.enrollment_step(), EnrollmentStep::Confirm);
        assert!(result.submission().is_none());
        let prompt = result.messages().next().unwrap();
        assert!(prompt.text.contains("Curso: Direito"));
        assert_eq!(prompt.suggested_actions.len(), 2);
    }

    #[test]
    fn confirmation_sim_submits() {
        let record = EnrollmentRecord::new("Ana", "ana@x.com", "Direito");
        let state = ConversationState::Confirming { record: record.clone() };
        let result = send(&state, &context().with_confirmation(true), " SIM ");
        assert_eq!(result.new_state, ConversationState::Submitting { record: record.clone() });
        assert_eq!(result.submission(), Some(&record));
    }

    #[test]
    fn confirmation_anything_else_cancels() {
        let state = ConversationState::Confirming {
            record: EnrollmentRecord::new("Ana", "ana@x.com", "Direito"),
        };
        let result = send(&state, &context().with_confirmation(true), "não");
        assert_eq!(result.new_state, ConversationState::Main);
        assert!(result.clears_state());
        assert!(result.submission().is_none());
        assert_eq!(texts(&result), vec![msg::CANCELLED]);
    }

    // ── Submission completion ───────────────────────────────────────

    fn submitting() -> ConversationState {
        ConversationState::Submitting {
            record: EnrollmentRecord::new("Ana", "ana@x.com", "Direito"),
        }
    }

    #[test]
    fn accepted_submission_summarizes_and_resets() {
        let event = Event::SubmissionCompleted {
            outcome: SubmissionOutcome::Accepted { id: Some("12".into()) },
        };
        let result = transition(&submitting(), &context(), event).unwrap();
        assert_eq!(result.new_state, ConversationState::Main);
        assert_eq!(result.new_state.menu(), MenuMode::Main);
        assert!(result.clears_state());
        let texts = texts(&result);
        for needle in ["Ana", "ana@x.com", "Direito", "12"] {
            assert!(texts[0].contains(needle));
        }
        assert_eq!(texts[1], msg::AT_YOUR_SERVICE);
    }

    #[test]
    fn failed_submission_apologizes_and_resets() {
        let event = Event::SubmissionCompleted { outcome: SubmissionOutcome::Failed };
        let result = transition(&submitting(), &context(), event).unwrap();
        assert_eq!(result.new_state, ConversationState::Main);
        assert!(result.clears_state());
        assert_eq!(texts(&result), vec![msg::SUBMISSION_FAILED, msg::AT_YOUR_SERVICE]);
    }

    #[test]
    fn completion_without_submission_is_rejected() {
        let event = Event::SubmissionCompleted { outcome: SubmissionOutcome::Failed };
        let err = transition(&ConversationState::Faq, &context(), event).unwrap_err();
        assert!(matches!(err, TransitionError::NoSubmissionInFlight { .. }));
    }

    #[test]
    fn message_during_stale_submission_resets_to_main() {
        let result = send(&submitting(), &context(), "perguntas frequentes");
        assert_eq!(result.new_state, ConversationState::Faq);
        assert!(result.submission().is_none());

        let result = send(&submitting(), &context(), "realizar matrícula");
        assert_eq!(result.new_state, ConversationState::AskingName);
    }

    // ── Scenario ────────────────────────────────────────────────────

    #[test]
    fn full_enrollment_scenario() {
        let ctx = context();
        let inputs = [
            "realizar matrícula",
            "Ana Souza",
            "not-an-email",
            "ana@exemplo.com",
            "Direito",
        ];
        let expected_steps = [
            EnrollmentStep::AskName,
            EnrollmentStep::AskEmail,
            EnrollmentStep::AskEmail,
            EnrollmentStep::AskCourse,
            EnrollmentStep::Confirm,
        ];

        let mut state = ConversationState::default();
        let mut submissions = Vec::new();
        for (input, expected) in inputs.iter().zip(expected_steps) {
            let result = send(&state, &ctx, input);
            assert_eq!(result.new_state.enrollment_step(), expected, "after {input:?}");
            submissions.extend(result.submission().cloned());
            state = result.new_state;
        }

        assert_eq!(
            submissions,
            vec![EnrollmentRecord::new("Ana Souza", "ana@exemplo.com", "Direito")]
        );

        let done = transition(
            &state,
            &ctx,
            Event::SubmissionCompleted {
                outcome: SubmissionOutcome::Accepted { id: None },
            },
        )
        .unwrap();
        assert_eq!(done.new_state, ConversationState::default());
        assert!(done.new_state.name().is_none());
        assert!(done.new_state.email().is_none());
        assert!(done.new_state.course().is_none());
    }
}
