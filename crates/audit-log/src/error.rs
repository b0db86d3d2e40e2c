use thiserror::Error;

use crate::{PartitionKey, SortKey};

/// Errors that can occur when interacting with the audit log.
#[derive(Debug, Error)]
pub enum AuditLogError {
    /// A record with the same partition and sort key already exists.
    /// Records are write-once, so the append is rejected.
    #[error("Audit record already exists: {pk} / {sk}")]
    DuplicateKey { pk: PartitionKey, sk: SortKey },

    /// A record was built without one of its required fields.
    #[error("Incomplete audit record: missing {0}")]
    IncompleteRecord(&'static str),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AuditLogError {
    /// Returns true if the underlying storage rejected the write.
    pub fn is_write_failure(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. } | Self::Database(_))
    }
}

/// Result type for audit log operations.
pub type Result<T> = std::result::Result<T, AuditLogError>;
