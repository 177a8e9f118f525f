//! Error types for the enrollment assistant.

use std::time::Duration;

/// Failure of one conversation turn, caught at the dispatcher boundary.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("State store error: {0}")]
    Store(#[from] StoreError),

    #[error("Flow error: {0}")]
    Flow(#[from] crate::flow::TransitionError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Conversation state store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("State for conversation {conversation_id} is unavailable: {reason}")]
    Unavailable {
        conversation_id: String,
        reason: String,
    },
}

/// Failures of the outbound enrollment submission.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("Enrollment backend unreachable: {0}")]
    Transport(String),

    #[error("Enrollment backend timed out after {0:?}")]
    Timeout(Duration),

    #[error("Enrollment backend rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Channel-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Failed to send response on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("Invalid message format: {0}")]
    InvalidMessage(String),
}

/// Enrollment backend database errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),
}
