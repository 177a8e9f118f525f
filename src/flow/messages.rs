//! User-facing texts, menus, and the outbound message type.

use serde::{Deserialize, Serialize};

use super::state::EnrollmentRecord;
use crate::faq::FaqStore;

pub const WELCOME: &str = "Olá! Sou o bot de atendimento. Selecione uma das opções abaixo.";
pub const NOT_UNDERSTOOD: &str = "Desculpe, não entendi. Por favor, escolha uma das opções.";
pub const ANYTHING_ELSE: &str = "Posso ajudar em algo mais?";
pub const BACK_TO_MAIN: &str = "Voltando ao menu principal.";
pub const AT_YOUR_SERVICE: &str = "Se precisar de algo mais, estou à disposição.";

pub const FAQ_PICK: &str = "Selecione uma das perguntas abaixo:";
pub const FAQ_ANOTHER: &str = "Posso ajudar com outra pergunta?";
pub const FAQ_NOT_FOUND: &str = "Não encontrei essa pergunta. Por favor, selecione uma das opções.";

pub const ASK_NAME: &str =
    "Entendido! Vamos iniciar a matrícula. Para começar, qual é o seu nome completo?";
pub const ASK_NAME_AGAIN: &str = "Por favor, informe o seu nome completo.";
pub const INVALID_EMAIL: &str = "Opa, e-mail inválido. Por favor, tente novamente.";
pub const ASK_COURSE: &str = "E-mail registrado! Para qual curso deseja se matricular?";
pub const ASK_COURSE_AGAIN: &str = "Por favor, informe o curso desejado.";
pub const CANCELLED: &str = "Ok, matrícula cancelada. Se desejar, podemos começar novamente.";
pub const SUBMISSION_FAILED: &str = "Concluímos a coleta dos seus dados, mas houve um problema ao registrá-los em nosso sistema. Por favor, tente novamente mais tarde.";
pub const INTERNAL_ERROR: &str = "Desculpe, parece que algo deu errado.";

/// Value of the main-menu option that starts the enrollment.
pub const ENROLL_VALUE: &str = "realizar matrícula";
/// Value of the main-menu option that opens the FAQ menu.
pub const FAQ_VALUE: &str = "perguntas frequentes";
/// Value of the FAQ-menu option that returns to the main menu.
pub const BACK_VALUE: &str = "voltar";

/// A quick-reply option attached to an outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedAction {
    /// Label shown to the user.
    pub title: String,
    /// Text sent back when the option is picked.
    pub value: String,
}

impl SuggestedAction {
    pub fn new(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
        }
    }
}

/// One outbound message: plain text, optionally with quick-reply options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggested_actions: Vec<SuggestedAction>,
}

impl OutgoingMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            suggested_actions: Vec::new(),
        }
    }

    pub fn with_actions(mut self, actions: Vec<SuggestedAction>) -> Self {
        self.suggested_actions = actions;
        self
    }
}

/// The two top-level options.
pub fn main_menu_actions() -> Vec<SuggestedAction> {
    vec![
        SuggestedAction::new("Perguntas Frequentes", FAQ_VALUE),
        SuggestedAction::new("Realizar Matrícula", ENROLL_VALUE),
    ]
}

/// One option per FAQ question, then the way back.
pub fn faq_menu_actions(faq: &FaqStore) -> Vec<SuggestedAction> {
    faq.questions()
        .map(|question| SuggestedAction::new(capitalize(question), question))
        .chain(std::iter::once(SuggestedAction::new("⬅️ Voltar", BACK_VALUE)))
        .collect()
}

pub fn main_menu(text: &str) -> OutgoingMessage {
    OutgoingMessage::text(text).with_actions(main_menu_actions())
}

pub fn faq_menu(text: &str, faq: &FaqStore) -> OutgoingMessage {
    OutgoingMessage::text(text).with_actions(faq_menu_actions(faq))
}

pub fn thanks_ask_email(name: &str) -> String {
    format!("Obrigado, {name}. Agora, informe seu melhor e-mail.")
}

/// Data review shown by the confirmation-gated flow.
pub fn confirm_prompt(record: &EnrollmentRecord) -> OutgoingMessage {
    let text = format!(
        "Por favor, confirme seus dados:\nNome: {}\nE-mail: {}\nCurso: {}\n\nEstá correto? (sim/não)",
        record.name, record.email, record.course
    );
    OutgoingMessage::text(text).with_actions(vec![
        SuggestedAction::new("Sim", "sim"),
        SuggestedAction::new("Não", "não"),
    ])
}

/// Summary sent after the backend accepted the enrollment.
pub fn success_summary(record: &EnrollmentRecord, id: Option<&str>) -> String {
    let mut summary = format!(
        "Ótimo! Sua pré-matrícula foi registrada com sucesso em nosso sistema.\n\n\
         **Nome:** {}\n\n**E-mail:** {}\n\n**Curso:** {}",
        record.name, record.email, record.course
    );
    if let Some(id) = id {
        summary.push_str(&format!("\n\n**Protocolo:** {id}"));
    }
    summary
}

/// Upper-case the first character and lower-case the rest.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
