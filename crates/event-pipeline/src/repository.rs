//! Translation of domain event payloads into audit records.

use std::sync::Arc;
use std::time::Duration;

use audit_log::{AuditLogStore, AuditRecord, PartitionKey, SortKey};
use chrono::{DateTime, Utc};
use common::{Clock, MessageId, OrderId, ProductId};
use domain::{Money, OrderEvent, ProductEvent};
use serde::Serialize;

use crate::Result;

const FIVE_MINUTES: Duration = Duration::from_secs(5 * 60);

/// How long audit records of each entity kind are retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub order_events: Duration,
    pub product_events: Duration,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            order_events: FIVE_MINUTES,
            product_events: FIVE_MINUTES,
        }
    }
}

/// Partition key of an order's history: `#order_<orderId>`.
pub fn order_partition_key(order_id: &OrderId) -> PartitionKey {
    PartitionKey::new(format!("#order_{order_id}"))
}

/// Partition key of a product's history: `#product_<productCode>`.
pub fn product_partition_key(product_code: &str) -> PartitionKey {
    PartitionKey::new(format!("#product_{product_code}"))
}

/// Sort key of one event: `<eventType>#<epochMillis>`.
pub fn sort_key(event_type: &str, at: DateTime<Utc>) -> SortKey {
    SortKey::new(format!("{event_type}#{}", at.timestamp_millis()))
}

fn expiry(at: DateTime<Utc>, retention: Duration) -> i64 {
    at.timestamp() + retention.as_secs() as i64
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderEventInfo<'a> {
    order_id: &'a OrderId,
    product_codes: &'a [String],
    message_id: MessageId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProductEventInfo<'a> {
    product_id: &'a ProductId,
    price: Money,
}

/// Writes one audit record per domain event.
///
/// Pure translation plus an append: no deduplication, no read-back.
#[derive(Clone)]
pub struct EventRepository {
    store: Arc<dyn AuditLogStore>,
    clock: Arc<dyn Clock>,
    retention: RetentionPolicy,
}

impl EventRepository {
    pub fn new(
        store: Arc<dyn AuditLogStore>,
        clock: Arc<dyn Clock>,
        retention: RetentionPolicy,
    ) -> Self {
        Self {
            store,
            clock,
            retention,
        }
    }

    /// Returns the retention policy in effect.
    pub fn retention(&self) -> RetentionPolicy {
        self.retention
    }

    /// Records an order event received from the channel.
    ///
    /// `event_type` is the envelope's discriminator and `message_id` the
    /// transport id of the delivery.
    #[tracing::instrument(skip(self, event), fields(order_id = %event.order_id))]
    pub async fn record_order_event(
        &self,
        event_type: &str,
        event: &OrderEvent,
        message_id: MessageId,
    ) -> Result<AuditRecord> {
        let now = self.clock.now();
        let record = AuditRecord::builder()
            .pk(order_partition_key(&event.order_id))
            .sk(sort_key(event_type, now))
            .ttl(expiry(now, self.retention.order_events))
            .email(event.email.as_str())
            .created_at(now)
            .request_id(event.request_id.as_str())
            .event_type(event_type)
            .info(&OrderEventInfo {
                order_id: &event.order_id,
                product_codes: &event.product_codes,
                message_id,
            })?
            .build()?;

        self.append(record, "order").await
    }

    /// Records a product event received by invocation.
    #[tracing::instrument(
        skip(self, event),
        fields(product_code = %event.product_code, event_type = %event.event_type)
    )]
    pub async fn record_product_event(&self, event: &ProductEvent) -> Result<AuditRecord> {
        let now = self.clock.now();
        let event_type = event.event_type.as_str();
        let record = AuditRecord::builder()
            .pk(product_partition_key(&event.product_code))
            .sk(sort_key(event_type, now))
            .ttl(expiry(now, self.retention.product_events))
            .email(event.email.as_str())
            .created_at(now)
            .request_id(event.request_id.as_str())
            .event_type(event_type)
            .info(&ProductEventInfo {
                product_id: &event.product_id,
                price: event.product_price,
            })?
            .build()?;

        self.append(record, "product").await
    }

    async fn append(&self, record: AuditRecord, entity: &'static str) -> Result<AuditRecord> {
        self.store.append(record.clone()).await?;

        metrics::counter!("audit_records_written_total", "entity" => entity).increment(1);
        tracing::debug!(pk = %record.pk, sk = %record.sk, "audit record written");

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audit_log::{AuditLogError, AuditLogStoreExt, InMemoryAuditLogStore};
    use chrono::TimeZone;
    use common::{ManualClock, RequestId};
    use domain::{
        Billing, Carrier, PaymentType, ProductEventType, Shipping, ShippingType,
    };

    use crate::PipelineError;

    const START_MILLIS: i64 = 1_700_000_000_000;

    fn setup() -> (EventRepository, InMemoryAuditLogStore, ManualClock) {
        let store = InMemoryAuditLogStore::new();
        let clock = ManualClock::new(Utc.timestamp_millis_opt(START_MILLIS).unwrap());
        let repo = EventRepository::new(
            Arc::new(store.clone()),
            Arc::new(clock.clone()),
            RetentionPolicy::default(),
        );
        (repo, store, clock)
    }

    fn order_event(order_id: &str) -> OrderEvent {
        OrderEvent {
            email: "a@b.com".to_string(),
            order_id: OrderId::new(order_id),
            billing: Billing {
                payment: PaymentType::Cash,
                total_price: Money::from_cents(2500),
            },
            shipping: Shipping {
                shipping_type: ShippingType::Urgent,
                carrier: Carrier::Fedex,
            },
            request_id: RequestId::new("req-1"),
            product_codes: vec!["A".to_string(), "B".to_string()],
        }
    }

    fn product_event(event_type: ProductEventType) -> ProductEvent {
        ProductEvent {
            request_id: RequestId::new("req-2"),
            event_type,
            product_id: ProductId::new("p-1"),
            product_code: "AB-1".to_string(),
            product_price: Money::from_cents(1000),
            email: "admin@shop.com".to_string(),
        }
    }

    #[test]
    fn key_formats() {
        assert_eq!(order_partition_key(&OrderId::new("X")).as_str(), "#order_X");
        assert_eq!(product_partition_key("Y").as_str(), "#product_Y");

        let at = Utc.timestamp_millis_opt(START_MILLIS).unwrap();
        assert_eq!(
            sort_key("ORDER_CREATED", at).as_str(),
            "ORDER_CREATED#1700000000000"
        );
    }

    #[tokio::test]
    async fn order_event_record_layout() {
        let (repo, store, _clock) = setup();
        let message_id = MessageId::new();

        let record = repo
            .record_order_event("ORDER_CREATED", &order_event("o-1"), message_id)
            .await
            .unwrap();

        assert_eq!(record.pk.as_str(), "#order_o-1");
        assert_eq!(record.sk.as_str(), "ORDER_CREATED#1700000000000");
        assert_eq!(record.ttl, START_MILLIS / 1000 + 300);
        assert_eq!(record.created_at, START_MILLIS);
        assert_eq!(record.email, "a@b.com");
        assert_eq!(record.request_id, "req-1");
        assert_eq!(record.event_type, "ORDER_CREATED");
        assert_eq!(record.info["orderId"], "o-1");
        assert_eq!(record.info["productCodes"], serde_json::json!(["A", "B"]));
        assert_eq!(record.info["messageId"], message_id.to_string());

        assert_eq!(store.record_count().await, 1);
    }

    #[tokio::test]
    async fn product_event_record_layout() {
        let (repo, _store, _clock) = setup();

        let record = repo
            .record_product_event(&product_event(ProductEventType::Created))
            .await
            .unwrap();

        assert_eq!(record.pk.as_str(), "#product_AB-1");
        assert_eq!(record.sk.as_str(), "PRODUCT_CREATED#1700000000000");
        assert_eq!(record.ttl, START_MILLIS / 1000 + 300);
        assert_eq!(record.email, "admin@shop.com");
        assert_eq!(record.info["productId"], "p-1");
        assert_eq!(record.info["price"], 10.0);
    }

    #[tokio::test]
    async fn sort_keys_follow_chronology() {
        let (repo, store, clock) = setup();
        let event = product_event(ProductEventType::Updated);

        for _ in 0..3 {
            repo.record_product_event(&event).await.unwrap();
            clock.advance_millis(1);
        }

        let history = store
            .partition_history(product_partition_key("AB-1"))
            .await
            .unwrap();
        let keys: Vec<_> = history.iter().map(|r| r.sk.as_str().to_string()).collect();
        assert_eq!(
            keys,
            vec![
                "PRODUCT_UPDATED#1700000000000",
                "PRODUCT_UPDATED#1700000000001",
                "PRODUCT_UPDATED#1700000000002",
            ]
        );
    }

    #[tokio::test]
    async fn same_millisecond_collision_is_rejected() {
        let (repo, store, _clock) = setup();
        let event = product_event(ProductEventType::Updated);

        repo.record_product_event(&event).await.unwrap();
        let second = repo.record_product_event(&event).await;

        assert!(matches!(
            second,
            Err(PipelineError::AuditLog(AuditLogError::DuplicateKey { .. }))
        ));
        assert_eq!(store.record_count().await, 1);
    }

    #[tokio::test]
    async fn retention_is_per_entity_kind() {
        let store = InMemoryAuditLogStore::new();
        let clock = ManualClock::new(Utc.timestamp_millis_opt(START_MILLIS).unwrap());
        let repo = EventRepository::new(
            Arc::new(store),
            Arc::new(clock),
            RetentionPolicy {
                order_events: Duration::from_secs(60),
                product_events: Duration::from_secs(3600),
            },
        );

        let order = repo
            .record_order_event("ORDER_DELETED", &order_event("o-1"), MessageId::new())
            .await
            .unwrap();
        let product = repo
            .record_product_event(&product_event(ProductEventType::Deleted))
            .await
            .unwrap();

        assert_eq!(order.ttl, START_MILLIS / 1000 + 60);
        assert_eq!(product.ttl, START_MILLIS / 1000 + 3600);
    }
}
