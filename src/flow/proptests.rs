//! Property-based tests for the conversation state machine.

use std::sync::Arc;

use proptest::prelude::*;

use super::*;
use crate::faq::FaqStore;

// ============================================================================
// Test Helpers
// ============================================================================

const FAQ_KEYS: [&str; 3] = [
    "qual o calendário acadêmico?",
    "como emitir boleto?",
    "secretaria",
];

fn test_context(confirm: bool) -> FlowContext {
    let faq = FaqStore::from_pairs(FAQ_KEYS.iter().map(|q| (*q, format!("resposta: {q}"))));
    FlowContext::new(Arc::new(faq)).with_confirmation(confirm)
}

/// Field presence must agree with the step, and nothing outside enrollment
/// carries collected data.
fn is_consistent(state: &ConversationState) -> bool {
    let step = state.enrollment_step();
    match state.menu() {
        MenuMode::Main | MenuMode::Faq => {
            step == EnrollmentStep::None
                && state.name().is_none()
                && state.email().is_none()
                && state.course().is_none()
        }
        MenuMode::Enrollment => match step {
            EnrollmentStep::None => false,
            EnrollmentStep::AskName => state.name().is_none(),
            EnrollmentStep::AskEmail => state.name().is_some() && state.email().is_none(),
            EnrollmentStep::AskCourse => state.email().is_some() && state.course().is_none(),
            EnrollmentStep::Confirm => state.course().is_some(),
        },
    }
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_menu_input() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("realizar matrícula".to_string()),
        Just("Realizar Matricula".to_string()),
        Just("perguntas frequentes".to_string()),
        Just("voltar".to_string()),
        Just("sim".to_string()),
        Just("não".to_string()),
        Just("ana@exemplo.com".to_string()),
        Just("   ".to_string()),
        prop::sample::select(FAQ_KEYS.to_vec()).prop_map(|q| q.to_uppercase()),
        "[a-zA-Z@. ]{0,20}",
    ]
}

fn arb_outcome() -> impl Strategy<Value = SubmissionOutcome> {
    prop_oneof![
        Just(SubmissionOutcome::Failed),
        proptest::option::of("[0-9]{1,6}").prop_map(|id| SubmissionOutcome::Accepted { id }),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        6 => arb_menu_input().prop_map(|text| Event::UserMessage { text }),
        1 => Just(Event::MembersAdded),
        1 => arb_outcome().prop_map(|outcome| Event::SubmissionCompleted { outcome }),
    ]
}

fn arb_invalid_email() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{1,12}",
        "[a-z]{1,8}@[a-z]{1,8}",
        "@[a-z]{1,8}\\.com",
        "[a-z]{1,5} [a-z]{1,5}@x\\.com",
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Any event sequence keeps the state internally consistent and never
    // strands a submission.
    #[test]
    fn prop_transitions_preserve_consistency(
        confirm in any::<bool>(),
        events in proptest::collection::vec(arb_event(), 0..30),
    ) {
        let ctx = test_context(confirm);
        let mut state = ConversationState::default();

        for event in events {
            match transition(&state, &ctx, event) {
                Ok(result) => {
                    if result.submission().is_some() {
                        prop_assert!(
                            matches!(result.new_state, ConversationState::Submitting { .. }),
                            "submit effect outside Submitting: {:?}", result.new_state
                        );
                    }
                    if result.clears_state() {
                        prop_assert!(result.new_state.is_reset());
                    }
                    state = result.new_state;
                    prop_assert!(is_consistent(&state), "inconsistent state: {:?}", state);
                }
                Err(TransitionError::NoSubmissionInFlight { .. }) => {
                    let submitting = matches!(state, ConversationState::Submitting { .. });
                    prop_assert!(!submitting);
                }
                Err(e) => prop_assert!(false, "unexpected error: {e}"),
            }
        }
    }

    // The join event always yields the two-option main menu without moving.
    #[test]
    fn prop_join_shows_main_menu(events in proptest::collection::vec(arb_event(), 0..10)) {
        let ctx = test_context(false);
        let mut state = ConversationState::default();
        for event in events {
            if let Ok(result) = transition(&state, &ctx, event) {
                state = result.new_state;
            }
        }

        let result = transition(&state, &ctx, Event::MembersAdded).unwrap();
        prop_assert_eq!(&result.new_state, &state);
        let replies: Vec<_> = result.messages().collect();
        prop_assert_eq!(replies.len(), 1);
        prop_assert_eq!(&replies[0].suggested_actions, &messages::main_menu_actions());
    }

    // A FAQ key typed at MAIN answers and stays at MAIN.
    #[test]
    fn prop_faq_key_at_main_answers(
        key in prop::sample::select(FAQ_KEYS.to_vec()),
        padding in "[ ]{0,3}",
        shout in any::<bool>(),
    ) {
        let ctx = test_context(false);
        let typed = if shout { key.to_uppercase() } else { key.to_string() };
        let result = transition(
            &ConversationState::Main,
            &ctx,
            Event::user_message(format!("{padding}{typed}{padding}")),
        ).unwrap();

        prop_assert_eq!(&result.new_state, &ConversationState::Main);
        let first = result.messages().next().unwrap();
        prop_assert_eq!(first.text.clone(), format!("resposta: {key}"));
    }

    // Bad addresses re-prompt without touching the stored name.
    #[test]
    fn prop_invalid_email_is_idempotent(
        name in "[A-Z][a-z]{1,10}( [A-Z][a-z]{1,10})?",
        email in arb_invalid_email(),
    ) {
        prop_assume!(!validation::is_valid_email(&email));
        let ctx = test_context(false);
        let state = ConversationState::AskingEmail { name: name.clone() };

        let result = transition(&state, &ctx, Event::user_message(email)).unwrap();
        prop_assert_eq!(&result.new_state, &state);
        prop_assert_eq!(result.new_state.name(), Some(name.as_str()));
        prop_assert_eq!(result.new_state.enrollment_step(), EnrollmentStep::AskEmail);
    }

    // Completing the three steps builds exactly one record, and either
    // outcome resets to the empty MAIN state.
    #[test]
    fn prop_completed_collection_submits_once(
        name in "[A-Z][a-z]{1,10}",
        user in "[a-z]{1,10}",
        course in "[A-Z][a-z]{2,12}",
        outcome in arb_outcome(),
    ) {
        let ctx = test_context(false);
        let email = format!("{user}@exemplo.com");
        let mut state = ConversationState::default();
        let mut records = Vec::new();

        for input in ["realizar matrícula", name.as_str(), email.as_str(), course.as_str()] {
            let result = transition(&state, &ctx, Event::user_message(input)).unwrap();
            records.extend(result.submission().cloned());
            state = result.new_state;
        }

        prop_assert_eq!(records, vec![EnrollmentRecord::new(&name, &email, &course)]);

        let done = transition(&state, &ctx, Event::SubmissionCompleted { outcome }).unwrap();
        prop_assert!(done.clears_state());
        prop_assert_eq!(done.new_state, ConversationState::default());
    }
}
