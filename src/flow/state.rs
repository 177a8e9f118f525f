//! Conversation state machine: tracks which menu and enrollment step a
//! conversation is in.

use serde::{Deserialize, Serialize};

/// Top-level mode of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuMode {
    Main,
    Faq,
    Enrollment,
}

impl std::fmt::Display for MenuMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Main => "main",
            Self::Faq => "faq",
            Self::Enrollment => "enrollment",
        };
        write!(f, "{s}")
    }
}

/// Which enrollment field is currently being collected.
///
/// Progresses linearly: AskName → AskEmail → AskCourse → Confirm.
/// `None` whenever the conversation is not enrolling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStep {
    None,
    AskName,
    AskEmail,
    AskCourse,
    Confirm,
}

impl EnrollmentStep {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: EnrollmentStep) -> bool {
        use EnrollmentStep::*;
        matches!(
            (self, target),
            (None, AskName)
                | (AskName, AskEmail)
                | (AskEmail, AskCourse)
                | (AskCourse, Confirm)
                // Completion, cancellation and resets.
                | (AskName | AskEmail | AskCourse | Confirm, None)
        )
    }
}

impl std::fmt::Display for EnrollmentStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::AskName => "ask_name",
            Self::AskEmail => "ask_email",
            Self::AskCourse => "ask_course",
            Self::Confirm => "confirm",
        };
        write!(f, "{s}")
    }
}

/// Snapshot of the three collected fields, taken when collection completes.
///
/// Serializes with the backend's wire names (`nome`, `email`, `curso`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    #[serde(rename = "curso")]
    pub course: String,
}

impl EnrollmentRecord {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        course: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            course: course.into(),
        }
    }
}

/// Per-conversation state record.
///
/// Each variant carries exactly the fields collected so far, so a field is
/// present only once its step has been passed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConversationState {
    #[default]
    Main,
    Faq,
    AskingName,
    AskingEmail {
        name: String,
    },
    AskingCourse {
        name: String,
        email: String,
    },
    /// All fields collected; waiting for the user's "sim".
    Confirming {
        record: EnrollmentRecord,
    },
    /// All fields collected; the submission call is in flight.
    Submitting {
        record: EnrollmentRecord,
    },
}

impl ConversationState {
    pub fn menu(&self) -> MenuMode {
        match self {
            Self::Main => MenuMode::Main,
            Self::Faq => MenuMode::Faq,
            Self::AskingName
            | Self::AskingEmail { .. }
            | Self::AskingCourse { .. }
            | Self::Confirming { .. }
            | Self::Submitting { .. } => MenuMode::Enrollment,
        }
    }

    pub fn enrollment_step(&self) -> EnrollmentStep {
        match self {
            Self::Main | Self::Faq => EnrollmentStep::None,
            Self::AskingName => EnrollmentStep::AskName,
            Self::AskingEmail { .. } => EnrollmentStep::AskEmail,
            Self::AskingCourse { .. } => EnrollmentStep::AskCourse,
            Self::Confirming { .. } | Self::Submitting { .. } => EnrollmentStep::Confirm,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::AskingEmail { name } | Self::AskingCourse { name, .. } => Some(name),
            Self::Confirming { record } | Self::Submitting { record } => Some(&record.name),
            _ => None,
        }
    }

    pub fn email(&self) -> Option<&str> {
        match self {
            Self::AskingCourse { email, .. } => Some(email),
            Self::Confirming { record } | Self::Submitting { record } => Some(&record.email),
            _ => None,
        }
    }

    pub fn course(&self) -> Option<&str> {
        match self {
            Self::Confirming { record } | Self::Submitting { record } => Some(&record.course),
            _ => None,
        }
    }

    /// Whether the state is the fresh, empty MAIN record.
    pub fn is_reset(&self) -> bool {
        matches!(self, Self::Main)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> EnrollmentRecord {
        EnrollmentRecord::new("Ana", "ana@x.com", "Direito")
    }

    #[test]
    fn default_state_is_main_without_data() {
        let state = ConversationState::default();
        assert_eq!(state.menu(), MenuMode::Main);
        assert_eq!(state.enrollment_step(), EnrollmentStep::None);
        assert!(state.name().is_none());
        assert!(state.email().is_none());
        assert!(state.course().is_none());
        assert!(state.is_reset());
    }

    #[test]
    fn step_is_none_outside_enrollment() {
        for state in [ConversationState::Main, ConversationState::Faq] {
            assert_ne!(state.menu(), MenuMode::Enrollment);
            assert_eq!(state.enrollment_step(), EnrollmentStep::None);
        }
    }

    #[test]
    fn fields_appear_as_steps_pass() {
        let asking_email = ConversationState::AskingEmail { name: "Ana".into() };
        assert_eq!(asking_email.enrollment_step(), EnrollmentStep::AskEmail);
        assert_eq!(asking_email.name(), Some("Ana"));
        assert!(asking_email.email().is_none());

        let asking_course = ConversationState::AskingCourse {
            name: "Ana".into(),
            email: "ana@x.com".into(),
        };
        assert_eq!(asking_course.email(), Some("ana@x.com"));
        assert!(asking_course.course().is_none());

        let submitting = ConversationState::Submitting { record: record() };
        assert_eq!(submitting.menu(), MenuMode::Enrollment);
        assert_eq!(submitting.enrollment_step(), EnrollmentStep::Confirm);
        assert_eq!(submitting.course(), Some("Direito"));
    }

    #[test]
    fn valid_step_transitions() {
        use EnrollmentStep::*;
        let transitions = [
            (None, AskName),
            (AskName, AskEmail),
            (AskEmail, AskCourse),
            (AskCourse, Confirm),
            (Confirm, None),
        ];
        for (from, to) in transitions {
            assert!(from.can_transition_to(to), "{from} should transition to {to}");
        }
    }

    #[test]
    fn invalid_step_transitions() {
        use EnrollmentStep::*;
        // Skip steps
        assert!(!None.can_transition_to(AskEmail));
        assert!(!AskName.can_transition_to(AskCourse));
        // Go backward
        assert!(!AskCourse.can_transition_to(AskEmail));
        // Self-transition
        assert!(!AskEmail.can_transition_to(AskEmail));
        assert!(!None.can_transition_to(None));
    }

    #[test]
    fn display_matches_serde() {
        use EnrollmentStep::*;
        for step in [None, AskName, AskEmail, AskCourse, Confirm] {
            let json = serde_json::to_string(&step).unwrap();
            assert_eq!(format!("\"{step}\""), json, "Display and serde should match for {step:?}");
        }
        for menu in [MenuMode::Main, MenuMode::Faq, MenuMode::Enrollment] {
            let json = serde_json::to_string(&menu).unwrap();
            assert_eq!(format!("\"{menu}\""), json);
        }
    }

    #[test]
    fn record_uses_backend_field_names() {
        let json = serde_json::to_value(record()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"nome": "Ana", "email": "ana@x.com", "curso": "Direito"})
        );
    }

    #[test]
    fn state_serde_roundtrip() {
        let state = ConversationState::AskingCourse {
            name: "Ana Souza".into(),
            email: "ana@exemplo.com".into(),
        };
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"state\":\"asking_course\""));
        let parsed: ConversationState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, state);
    }
}
