//! Pipeline error types.

use audit_log::AuditLogError;
use thiserror::Error;

/// Errors that can occur while emitting, delivering or recording events.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The channel could not accept the message.
    #[error("Channel error: {0}")]
    Channel(String),

    /// Publish to a topic that was never created.
    #[error("Unknown topic: {0}")]
    UnknownTopic(String),

    /// Invocation of a target that was never registered.
    #[error("Unknown invocation target: {0}")]
    UnknownTarget(String),

    /// The invoked target reported a failure.
    #[error("Invocation of '{target}' failed: {reason}")]
    Invocation { target: String, reason: String },

    /// The payload names a different event type than the one emitted.
    #[error("Event type mismatch: emitted {emitted}, payload carries {payload}")]
    EventTypeMismatch { emitted: String, payload: String },

    /// A message or payload did not parse as the expected type.
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// The audit log rejected a record.
    #[error("Audit log error: {0}")]
    AuditLog(#[from] AuditLogError),
}

/// Convenience type alias for pipeline results.
pub type Result<T> = std::result::Result<T, PipelineError>;
