use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{
    AuditLogError, AuditQuery, AuditRecord, PartitionKey, Result, SortKey, SortOrder,
    store::AuditLogStore,
};

type Partition = BTreeMap<SortKey, AuditRecord>;

/// In-memory audit log implementation for testing and local runs.
///
/// Records are kept per partition in sort-key order, which gives the same
/// range-query semantics as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryAuditLogStore {
    partitions: Arc<RwLock<BTreeMap<PartitionKey, Partition>>>,
}

impl InMemoryAuditLogStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of records stored.
    pub async fn record_count(&self) -> usize {
        self.partitions
            .read()
            .await
            .values()
            .map(|partition| partition.len())
            .sum()
    }

    /// Returns every stored record, grouped by partition and sorted by key.
    pub async fn all_records(&self) -> Vec<AuditRecord> {
        self.partitions
            .read()
            .await
            .values()
            .flat_map(|partition| partition.values().cloned())
            .collect()
    }

    /// Clears all records.
    pub async fn clear(&self) {
        self.partitions.write().await.clear();
    }
}

#[async_trait]
impl AuditLogStore for InMemoryAuditLogStore {
    async fn append(&self, record: AuditRecord) -> Result<()> {
        let mut partitions = self.partitions.write().await;
        let partition = partitions.entry(record.pk.clone()).or_default();

        if partition.contains_key(&record.sk) {
            return Err(AuditLogError::DuplicateKey {
                pk: record.pk,
                sk: record.sk,
            });
        }

        partition.insert(record.sk.clone(), record);
        Ok(())
    }

    async fn query(&self, query: AuditQuery) -> Result<Vec<AuditRecord>> {
        let partitions = self.partitions.read().await;
        let Some(partition) = partitions.get(&query.partition) else {
            return Ok(Vec::new());
        };

        let matching = partition
            .iter()
            .filter(|(sk, _)| query.matches_sort_key(sk))
            .map(|(_, record)| record.clone());

        let mut records: Vec<_> = match query.order {
            SortOrder::Ascending => matching.collect(),
            SortOrder::Descending => matching.rev().collect(),
        };

        if let Some(limit) = query.limit {
            records.truncate(limit);
        }

        Ok(records)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut partitions = self.partitions.write().await;
        let mut removed = 0u64;

        for partition in partitions.values_mut() {
            let before = partition.len();
            partition.retain(|_, record| !record.is_expired(now));
            removed += (before - partition.len()) as u64;
        }
        partitions.retain(|_, partition| !partition.is_empty());

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn create_test_record(pk: &str, event_type: &str, millis: i64) -> AuditRecord {
        AuditRecord::builder()
            .pk(PartitionKey::new(pk))
            .sk(SortKey::new(format!("{event_type}#{millis}")))
            .ttl(millis / 1000 + 300)
            .email("a@b.com")
            .created_at(Utc.timestamp_millis_opt(millis).unwrap())
            .request_id("req-1")
            .event_type(event_type)
            .info_raw(serde_json::json!({"test": true}))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn append_single_record() {
        let store = InMemoryAuditLogStore::new();
        let record = create_test_record("#order_1", "ORDER_CREATED", 1_700_000_000_000);

        store.append(record.clone()).await.unwrap();

        let history = store
            .query(AuditQuery::for_partition(PartitionKey::new("#order_1")))
            .await
            .unwrap();
        assert_eq!(history, vec![record]);
        assert_eq!(store.record_count().await, 1);
    }

    #[tokio::test]
    async fn duplicate_key_is_rejected_and_original_kept() {
        let store = InMemoryAuditLogStore::new();
        let original = create_test_record("#order_1", "ORDER_CREATED", 1_700_000_000_000);
        let mut clash = original.clone();
        clash.email = "other@b.com".to_string();

        store.append(original).await.unwrap();
        let result = store.append(clash).await;

        assert!(matches!(result, Err(AuditLogError::DuplicateKey { .. })));
        assert!(result.unwrap_err().is_write_failure());

        let history = store
            .query(AuditQuery::for_partition(PartitionKey::new("#order_1")))
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].email, "a@b.com");
    }

    #[tokio::test]
    async fn query_returns_partition_in_sort_key_order() {
        let store = InMemoryAuditLogStore::new();

        store
            .append(create_test_record("#order_1", "ORDER_CREATED", 1_700_000_000_002))
            .await
            .unwrap();
        store
            .append(create_test_record("#order_1", "ORDER_CREATED", 1_700_000_000_000))
            .await
            .unwrap();
        store
            .append(create_test_record("#order_2", "ORDER_CREATED", 1_700_000_000_001))
            .await
            .unwrap();
        store
            .append(create_test_record("#order_1", "ORDER_CREATED", 1_700_000_000_001))
            .await
            .unwrap();

        let history = store
            .query(AuditQuery::for_partition(PartitionKey::new("#order_1")))
            .await
            .unwrap();

        let created: Vec<_> = history.iter().map(|r| r.created_at).collect();
        assert_eq!(
            created,
            vec![1_700_000_000_000, 1_700_000_000_001, 1_700_000_000_002]
        );
    }

    #[tokio::test]
    async fn query_descending_with_limit() {
        let store = InMemoryAuditLogStore::new();
        for millis in [10_000, 20_000, 30_000] {
            store
                .append(create_test_record("#product_AB-1", "PRODUCT_UPDATED", millis))
                .await
                .unwrap();
        }

        let latest = store
            .query(
                AuditQuery::for_partition(PartitionKey::new("#product_AB-1"))
                    .descending()
                    .limit(2),
            )
            .await
            .unwrap();

        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].created_at, 30_000);
        assert_eq!(latest[1].created_at, 20_000);
    }

    #[tokio::test]
    async fn query_filters_by_event_type() {
        let store = InMemoryAuditLogStore::new();
        store
            .append(create_test_record("#order_1", "ORDER_CREATED", 1_000))
            .await
            .unwrap();
        store
            .append(create_test_record("#order_1", "ORDER_DELETED", 2_000))
            .await
            .unwrap();

        let deleted = store
            .query(
                AuditQuery::for_partition(PartitionKey::new("#order_1"))
                    .event_type("ORDER_DELETED"),
            )
            .await
            .unwrap();

        assert_eq!(deleted.len(), 1);
        assert_eq!(deleted[0].event_type, "ORDER_DELETED");
    }

    #[tokio::test]
    async fn query_unknown_partition_is_empty() {
        let store = InMemoryAuditLogStore::new();
        let records = store
            .query(AuditQuery::for_partition(PartitionKey::new("#order_none")))
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn purge_removes_only_expired_records() {
        let store = InMemoryAuditLogStore::new();
        // ttl = 1 + 300 and 1000 + 300 seconds
        store
            .append(create_test_record("#order_1", "ORDER_CREATED", 1_000))
            .await
            .unwrap();
        store
            .append(create_test_record("#order_2", "ORDER_CREATED", 1_000_000))
            .await
            .unwrap();

        let now = Utc.timestamp_opt(301, 0).unwrap();
        let removed = store.purge_expired(now).await.unwrap();

        assert_eq!(removed, 1);
        assert_eq!(store.record_count().await, 1);
        assert_eq!(store.all_records().await[0].pk.as_str(), "#order_2");
    }

    #[tokio::test]
    async fn latest_returns_newest_record() {
        use crate::AuditLogStoreExt;

        let store = InMemoryAuditLogStore::new();
        store
            .append(create_test_record("#order_1", "ORDER_CREATED", 1_000))
            .await
            .unwrap();
        store
            .append(create_test_record("#order_1", "ORDER_CREATED", 2_000))
            .await
            .unwrap();

        let latest = store
            .latest(PartitionKey::new("#order_1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.created_at, 2_000);
    }

    #[tokio::test]
    async fn history_follows_event_time_across_event_types() {
        use crate::AuditLogStoreExt;

        let store = InMemoryAuditLogStore::new();
        for (event_type, millis) in [
            ("PRODUCT_CREATED", 1_000),
            ("PRODUCT_UPDATED", 1_001),
            ("PRODUCT_DELETED", 1_002),
        ] {
            store
                .append(create_test_record("#product_AB-1", event_type, millis))
                .await
                .unwrap();
        }
        let pk = PartitionKey::new("#product_AB-1");

        // Raw queries stay in sort-key order.
        let by_key: Vec<_> = store
            .query(AuditQuery::for_partition(pk.clone()))
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.event_type)
            .collect();
        assert_eq!(
            by_key,
            vec!["PRODUCT_CREATED", "PRODUCT_DELETED", "PRODUCT_UPDATED"]
        );

        let history: Vec<_> = store
            .partition_history(pk.clone())
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.event_type)
            .collect();
        assert_eq!(
            history,
            vec!["PRODUCT_CREATED", "PRODUCT_UPDATED", "PRODUCT_DELETED"]
        );

        let latest = store.latest(pk).await.unwrap().unwrap();
        assert_eq!(latest.event_type, "PRODUCT_DELETED");
    }
}
