use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AuditLogError, Result};

/// Partition key of an audit record.
///
/// All records describing one logical entity share a partition, so the
/// history of that entity is a single range query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartitionKey(String);

impl PartitionKey {
    /// Wraps a raw partition key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sort key of an audit record, ordering records within a partition.
///
/// Ordering is plain lexicographic string ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortKey(String);

impl SortKey {
    /// Wraps a raw sort key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the key starts with `prefix`.
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An immutable, time-bounded entry describing one domain event occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    /// Groups all records of one entity.
    pub pk: PartitionKey,

    /// Orders records within the partition.
    pub sk: SortKey,

    /// Expiry instant in epoch seconds. The store purges the record after it.
    pub ttl: i64,

    /// Email of the customer or user behind the event.
    pub email: String,

    /// Creation instant in epoch milliseconds.
    pub created_at: i64,

    /// Correlation id of the request that triggered the event.
    pub request_id: String,

    /// The event type (e.g. "ORDER_CREATED").
    pub event_type: String,

    /// Entity-specific identifiers needed to reconstruct the action.
    pub info: serde_json::Value,
}

impl AuditRecord {
    /// Creates a new audit record builder.
    pub fn builder() -> AuditRecordBuilder {
        AuditRecordBuilder::default()
    }

    /// Returns the expiry instant, if representable.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.ttl, 0)
    }

    /// Returns true if the record is eligible for removal at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.ttl <= now.timestamp()
    }
}

/// Builder for constructing audit records.
#[derive(Debug, Default)]
pub struct AuditRecordBuilder {
    pk: Option<PartitionKey>,
    sk: Option<SortKey>,
    ttl: Option<i64>,
    email: Option<String>,
    created_at: Option<i64>,
    request_id: Option<String>,
    event_type: Option<String>,
    info: Option<serde_json::Value>,
}

impl AuditRecordBuilder {
    /// Sets the partition key.
    pub fn pk(mut self, pk: PartitionKey) -> Self {
        self.pk = Some(pk);
        self
    }

    /// Sets the sort key.
    pub fn sk(mut self, sk: SortKey) -> Self {
        self.sk = Some(sk);
        self
    }

    /// Sets the expiry instant in epoch seconds.
    pub fn ttl(mut self, ttl: i64) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Sets the email.
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the creation instant.
    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at.timestamp_millis());
        self
    }

    /// Sets the correlation id.
    pub fn request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Sets the event type.
    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    /// Sets the info block from a serializable value.
    pub fn info<T: Serialize>(mut self, info: &T) -> Result<Self> {
        self.info = Some(serde_json::to_value(info)?);
        Ok(self)
    }

    /// Sets the info block from a raw JSON value.
    pub fn info_raw(mut self, info: serde_json::Value) -> Self {
        self.info = Some(info);
        self
    }

    /// Builds the record, failing if a required field was not set.
    pub fn build(self) -> Result<AuditRecord> {
        Ok(AuditRecord {
            pk: self.pk.ok_or(AuditLogError::IncompleteRecord("pk"))?,
            sk: self.sk.ok_or(AuditLogError::IncompleteRecord("sk"))?,
            ttl: self.ttl.ok_or(AuditLogError::IncompleteRecord("ttl"))?,
            email: self.email.ok_or(AuditLogError::IncompleteRecord("email"))?,
            created_at: self
                .created_at
                .ok_or(AuditLogError::IncompleteRecord("created_at"))?,
            request_id: self
                .request_id
                .ok_or(AuditLogError::IncompleteRecord("request_id"))?,
            event_type: self
                .event_type
                .ok_or(AuditLogError::IncompleteRecord("event_type"))?,
            info: self.info.ok_or(AuditLogError::IncompleteRecord("info"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn complete_builder() -> AuditRecordBuilder {
        AuditRecord::builder()
            .pk(PartitionKey::new("#order_1"))
            .sk(SortKey::new("ORDER_CREATED#1700000000000"))
            .ttl(1_700_000_300)
            .email("a@b.com")
            .created_at(Utc.timestamp_millis_opt(1_700_000_000_000).unwrap())
            .request_id("req-1")
            .event_type("ORDER_CREATED")
            .info_raw(serde_json::json!({"orderId": "1"}))
    }

    #[test]
    fn builder_sets_every_field() {
        let record = complete_builder().build().unwrap();

        assert_eq!(record.pk.as_str(), "#order_1");
        assert_eq!(record.sk.as_str(), "ORDER_CREATED#1700000000000");
        assert_eq!(record.ttl, 1_700_000_300);
        assert_eq!(record.created_at, 1_700_000_000_000);
        assert_eq!(record.info["orderId"], "1");
    }

    #[test]
    fn builder_reports_missing_field() {
        let result = AuditRecord::builder()
            .pk(PartitionKey::new("#order_1"))
            .build();
        assert!(matches!(
            result,
            Err(AuditLogError::IncompleteRecord("sk"))
        ));
    }

    #[test]
    fn record_serializes_with_wire_names() {
        let record = complete_builder().build().unwrap();
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["pk"], "#order_1");
        assert_eq!(json["createdAt"], 1_700_000_000_000_i64);
        assert_eq!(json["requestId"], "req-1");
        assert_eq!(json["eventType"], "ORDER_CREATED");
    }

    #[test]
    fn expiry_is_inclusive_of_ttl_second() {
        let record = complete_builder().build().unwrap();

        let before = Utc.timestamp_opt(1_700_000_299, 0).unwrap();
        let at = Utc.timestamp_opt(1_700_000_300, 0).unwrap();

        assert!(!record.is_expired(before));
        assert!(record.is_expired(at));
        assert_eq!(record.expires_at(), Some(at));
    }

    #[test]
    fn sort_keys_order_lexicographically() {
        let a = SortKey::new("ORDER_CREATED#1700000000000");
        let b = SortKey::new("ORDER_CREATED#1700000000001");
        assert!(a < b);
        assert!(a.starts_with("ORDER_CREATED#"));
    }
}
