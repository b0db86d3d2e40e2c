use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{AuditQuery, AuditRecord, PartitionKey, Result};

/// Core trait for audit log implementations.
///
/// The audit log is an append-only sink: records are written once, never
/// updated, and removed only by expiry. All implementations must be
/// thread-safe (Send + Sync).
#[async_trait]
pub trait AuditLogStore: Send + Sync {
    /// Persists a new record.
    ///
    /// The write is conditional on the `(pk, sk)` pair being unused; a
    /// collision fails with `DuplicateKey` and leaves the existing record
    /// untouched. The caller does not retry.
    async fn append(&self, record: AuditRecord) -> Result<()>;

    /// Returns the records of one partition matching the query, ordered by
    /// sort key.
    async fn query(&self, query: AuditQuery) -> Result<Vec<AuditRecord>>;

    /// Removes every record whose `ttl` is at or before `now`.
    ///
    /// Returns the number of records removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}

/// Extension trait providing convenience methods for audit log stores.
#[async_trait]
pub trait AuditLogStoreExt: AuditLogStore {
    /// Returns the full history of one partition in the order the events
    /// happened.
    ///
    /// Sort keys lead with the event type, so `query` only orders events of
    /// one type chronologically. History is ordered by `created_at`, with the
    /// sort key breaking ties.
    async fn partition_history(&self, partition: PartitionKey) -> Result<Vec<AuditRecord>> {
        let mut records = self.query(AuditQuery::for_partition(partition)).await?;
        records.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.sk.cmp(&b.sk))
        });
        Ok(records)
    }

    /// Returns the record of the most recent event in one partition, if any.
    async fn latest(&self, partition: PartitionKey) -> Result<Option<AuditRecord>> {
        Ok(self.partition_history(partition).await?.pop())
    }
}

// Blanket implementation for all AuditLogStore implementations
impl<T: AuditLogStore + ?Sized> AuditLogStoreExt for T {}
