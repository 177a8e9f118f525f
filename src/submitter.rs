//! Enrollment submitter: hands a completed record to the enrollment backend.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::SubmitError;
use crate::flow::EnrollmentRecord;

/// What the backend told us about an accepted enrollment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionReceipt {
    /// Backend identifier of the stored enrollment, when it returned one.
    pub id: Option<String>,
    pub message: Option<String>,
}

/// Narrow capability the dispatcher uses to submit a record.
#[async_trait]
pub trait EnrollmentSubmitter: Send + Sync {
    async fn submit(&self, record: &EnrollmentRecord) -> Result<SubmissionReceipt, SubmitError>;
}

/// POSTs the record as JSON to the configured enrollment endpoint.
pub struct HttpSubmitter {
    client: reqwest::Client,
    url: reqwest::Url,
    timeout: Duration,
}

impl HttpSubmitter {
    pub fn new(url: reqwest::Url, timeout: Duration) -> Result<Self, SubmitError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SubmitError::Transport(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            url,
            timeout,
        })
    }
}

#[async_trait]
impl EnrollmentSubmitter for HttpSubmitter {
    async fn submit(&self, record: &EnrollmentRecord) -> Result<SubmissionReceipt, SubmitError> {
        debug!(url = %self.url, email = %record.email, "Submitting enrollment");

        let response = self
            .client
            .post(self.url.clone())
            .json(record)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SubmitError::Timeout(self.timeout)
                } else {
                    SubmitError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        // Bodies are informational; an unreadable or non-JSON body never
        // changes the outcome decided by the status code.
        let body: Value = match response.text().await {
            Ok(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
            Err(e) => {
                warn!(error = %e, "Failed to read enrollment backend response body");
                Value::Null
            }
        };

        if status.is_success() {
            let receipt = receipt_from_body(&body);
            info!(
                status = status.as_u16(),
                id = ?receipt.id,
                backend_message = ?receipt.message,
                "Enrollment accepted"
            );
            Ok(receipt)
        } else {
            Err(SubmitError::Rejected {
                status: status.as_u16(),
                message: error_message(&body),
            })
        }
    }
}

/// Pull `matricula_id`/`id` and `mensagem`/`message` out of a success body.
pub fn receipt_from_body(body: &Value) -> SubmissionReceipt {
    let id = ["matricula_id", "id"]
        .iter()
        .find_map(|key| body.get(key))
        .and_then(id_to_string);
    let message = ["mensagem", "message"]
        .iter()
        .find_map(|key| body.get(key)?.as_str())
        .map(str::to_string);
    SubmissionReceipt { id, message }
}

fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `erro`/`error` from an error body, or the raw body text.
fn error_message(body: &Value) -> String {
    ["erro", "error"]
        .iter()
        .find_map(|key| body.get(key)?.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| match body {
            Value::String(text) => text.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        })
}
