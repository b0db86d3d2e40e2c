pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod record;
pub mod store;

pub use error::{AuditLogError, Result};
pub use memory::InMemoryAuditLogStore;
pub use postgres::PostgresAuditLogStore;
pub use query::{AuditQuery, SortOrder};
pub use record::{AuditRecord, AuditRecordBuilder, PartitionKey, SortKey};
pub use store::{AuditLogStore, AuditLogStoreExt};
