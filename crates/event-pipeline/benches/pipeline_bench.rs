use std::sync::Arc;

use audit_log::InMemoryAuditLogStore;
use common::{OrderId, RequestId, SystemClock};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{
    Billing, Carrier, Envelope, Money, NewOrder, OrderEvent, OrderEventType, OrderProduct,
    PaymentType, Shipping, ShippingType,
};
use event_pipeline::{
    ChannelConfig, EventRepository, InMemoryChannel, OrderEventsSubscriber, Publisher,
    RetentionPolicy,
};

fn order_event() -> OrderEvent {
    let order = NewOrder {
        email: "bench@example.com".to_string(),
        shipping: Shipping {
            shipping_type: ShippingType::Urgent,
            carrier: Carrier::Fedex,
        },
        billing: Billing {
            payment: PaymentType::CreditCard,
            total_price: Money::from_cents(2500),
        },
        products: vec![
            OrderProduct {
                code: "A".to_string(),
                price: Money::from_cents(1000),
            },
            OrderProduct {
                code: "B".to_string(),
                price: Money::from_cents(1500),
            },
        ],
    }
    .into_order(OrderId::generate(), chrono::Utc::now());
    OrderEvent::from_order(&order, RequestId::generate())
}

fn bench_publish_and_record(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (channel, store) = rt.block_on(async {
        let store = InMemoryAuditLogStore::new();
        let repository = EventRepository::new(
            Arc::new(store.clone()),
            Arc::new(SystemClock),
            RetentionPolicy::default(),
        );
        let channel = InMemoryChannel::new(ChannelConfig::default());
        channel.create_topic("order-events").await;
        channel
            .subscribe(
                "order-events",
                "recorder",
                Arc::new(OrderEventsSubscriber::new(repository)),
            )
            .await
            .unwrap();
        (channel, store)
    });

    // Each message belongs to a distinct order so sort keys never collide.
    let envelopes: Vec<Envelope> = (0..100)
        .map(|_| Envelope::wrap(OrderEventType::Created.as_str(), &order_event()).unwrap())
        .collect();

    c.bench_function("pipeline/publish_and_record_100_order_events", |b| {
        b.iter(|| {
            rt.block_on(async {
                for envelope in &envelopes {
                    channel.publish("order-events", envelope).await.unwrap();
                }
                channel.wait_idle().await;
                store.clear().await;
            });
        });
    });
}

criterion_group!(benches, bench_publish_and_record);
criterion_main!(benches);
