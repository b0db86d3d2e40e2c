//! Consumers that turn delivered events into audit records.

use async_trait::async_trait;
use domain::{Envelope, OrderEvent, ProductEvent};

use crate::Result;
use crate::channel::{Delivery, Subscriber};
use crate::invoke::{InvocationContext, InvocationTarget};
use crate::repository::EventRepository;

/// Records every order event delivered on the order-events topic.
///
/// A redelivered message is recorded again; records are not deduplicated.
#[derive(Clone)]
pub struct OrderEventsSubscriber {
    repository: EventRepository,
}

impl OrderEventsSubscriber {
    pub fn new(repository: EventRepository) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl Subscriber for OrderEventsSubscriber {
    #[tracing::instrument(
        skip(self, delivery),
        fields(message_id = %delivery.message_id, attempt = delivery.attempt)
    )]
    async fn on_message(&self, delivery: &Delivery) -> Result<()> {
        let envelope = Envelope::from_message(&delivery.message)?;
        let event: OrderEvent = envelope.open()?;

        let record = self
            .repository
            .record_order_event(&envelope.event_type, &event, delivery.message_id)
            .await?;

        tracing::info!(
            event_type = %envelope.event_type,
            order_id = %event.order_id,
            sk = %record.sk,
            "order event recorded"
        );
        Ok(())
    }
}

/// Invocation target recording product events.
///
/// Responds with `"OK"` once the record is written.
#[derive(Clone)]
pub struct ProductEventsFunction {
    repository: EventRepository,
}

impl ProductEventsFunction {
    pub fn new(repository: EventRepository) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl InvocationTarget for ProductEventsFunction {
    #[tracing::instrument(skip(self, payload, context), fields(invocation_id = %context.invocation_id))]
    async fn handle(
        &self,
        payload: serde_json::Value,
        context: &InvocationContext,
    ) -> Result<serde_json::Value> {
        let event: ProductEvent = serde_json::from_value(payload)?;

        let record = self.repository.record_product_event(&event).await?;

        tracing::info!(
            event_type = %event.event_type,
            product_code = %event.product_code,
            request_id = %context.correlation.request_id,
            sk = %record.sk,
            "product event recorded"
        );
        Ok(serde_json::json!("OK"))
    }
}
