//! Webhook channel: receives Bot-Framework-style activities over HTTP and
//! answers in the response body.
//!
//! Each request is one turn. Requests for different conversations run
//! concurrently; the dispatcher serializes turns of the same conversation.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use crate::channels::IncomingMessage;
use crate::dispatcher::TurnDispatcher;
use crate::error::ChannelError;
use crate::flow::{OutgoingMessage, SuggestedAction};

const CHANNEL_NAME: &str = "webhook";

// ── Wire format ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChannelAccount {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConversationAccount {
    pub id: String,
}

/// Inbound activity. Only the fields the bot reads are modelled.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
    pub conversation: Option<ConversationAccount>,
    #[serde(default)]
    pub from: Option<ChannelAccount>,
    #[serde(default)]
    pub recipient: Option<ChannelAccount>,
    #[serde(default)]
    pub members_added: Vec<ChannelAccount>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardAction {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuggestedActions {
    pub actions: Vec<CardAction>,
}

/// Outbound activity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReplyActivity {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_actions: Option<SuggestedActions>,
}

impl From<OutgoingMessage> for ReplyActivity {
    fn from(message: OutgoingMessage) -> Self {
        let suggested_actions = (!message.suggested_actions.is_empty()).then(|| SuggestedActions {
            actions: message
                .suggested_actions
                .into_iter()
                .map(|SuggestedAction { title, value }| CardAction {
                    kind: "imBack".to_string(),
                    title,
                    value,
                })
                .collect(),
        });
        Self {
            kind: "message".to_string(),
            text: message.text,
            suggested_actions,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebhookReply {
    pub activities: Vec<ReplyActivity>,
}

/// Translate an activity into zero or more turns.
///
/// `conversationUpdate` yields one join per added member other than the bot
/// itself; unknown activity types yield nothing.
pub fn to_incoming(activity: &Activity) -> Result<Vec<IncomingMessage>, ChannelError> {
    let conversation_id = activity
        .conversation
        .as_ref()
        .map(|c| c.id.trim())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ChannelError::InvalidMessage("activity has no conversation id".into()))?;

    let from_id = activity
        .from
        .as_ref()
        .map(|f| f.id.as_str())
        .filter(|id| !id.is_empty())
        .unwrap_or(conversation_id);

    match activity.kind.as_str() {
        "message" => {
            let text = activity.text.as_deref().unwrap_or_default();
            Ok(vec![
                IncomingMessage::new(CHANNEL_NAME, from_id, text)
                    .with_conversation(conversation_id),
            ])
        }
        "conversationUpdate" => {
            let bot_id = activity.recipient.as_ref().map(|r| r.id.as_str());
            Ok(activity
                .members_added
                .iter()
                .filter(|member| Some(member.id.as_str()) != bot_id)
                .map(|member| {
                    IncomingMessage::members_added(CHANNEL_NAME, &member.id)
                        .with_conversation(conversation_id)
                })
                .collect())
        }
        other => {
            debug!(activity_type = other, "Ignoring activity");
            Ok(Vec::new())
        }
    }
}

// ── Routes ──────────────────────────────────────────────────────────────

/// Build the bot's HTTP router: `POST /api/messages` and `GET /health`.
pub fn webhook_routes(dispatcher: Arc<TurnDispatcher>) -> Router {
    Router::new()
        .route("/api/messages", post(receive_activity))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(dispatcher)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "matricula-assist"
    }))
}

async fn receive_activity(
    State(dispatcher): State<Arc<TurnDispatcher>>,
    payload: Result<Json<Activity>, JsonRejection>,
) -> Response {
    let Json(activity) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Rejected webhook payload");
            return rejection.into_response();
        }
    };

    let turns = match to_incoming(&activity) {
        Ok(turns) => turns,
        Err(e) => {
            warn!(error = %e, "Invalid activity");
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response();
        }
    };

    let mut reply = WebhookReply::default();
    for turn in &turns {
        reply
            .activities
            .extend(dispatcher.handle(turn).await.into_iter().map(ReplyActivity::from));
    }
    Json(reply).into_response()
}
