//! Domain error types.

use thiserror::Error;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The requested entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Input was malformed or referenced products that do not exist.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The store rejected a write, e.g. a conditional update on a missing key.
    #[error("Write rejected for {entity} {id}: {reason}")]
    WriteFailure {
        entity: &'static str,
        id: String,
        reason: String,
    },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    /// Shorthand for a missing entity.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Shorthand for a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Write failure raised when a conditional write finds no existing entity.
    pub fn missing_on_write(entity: &'static str, id: impl Into<String>) -> Self {
        Self::WriteFailure {
            entity,
            id: id.into(),
            reason: "conditional check failed: entity does not exist".to_string(),
        }
    }
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
