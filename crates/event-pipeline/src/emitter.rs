//! Emission strategies for domain events.
//!
//! Orders and products emit their events differently: order events are
//! published on a topic and recorded asynchronously, product events are
//! handed to a function that records them before the caller continues.
//! Both sit behind [`EventEmitter`] so handlers do not care which one they
//! hold.

use std::sync::Arc;

use async_trait::async_trait;
use common::MessageId;
use domain::Envelope;
use serde::Serialize;

use crate::channel::Publisher;
use crate::{PipelineError, Result};
use crate::invoke::{CorrelationContext, InvocationResponse, Invoker};

/// Outcome of a successful emission.
#[derive(Debug, Clone, PartialEq)]
pub enum EmitReceipt {
    /// The event was accepted by the channel under this message id.
    Published(MessageId),

    /// The event was recorded by a synchronous invocation.
    Invoked(InvocationResponse),
}

impl EmitReceipt {
    /// Returns the message id if the event was published.
    pub fn message_id(&self) -> Option<MessageId> {
        match self {
            EmitReceipt::Published(id) => Some(*id),
            EmitReceipt::Invoked(_) => None,
        }
    }
}

/// Rejects payloads whose own `eventType` field disagrees with `event_type`.
fn check_event_type(event_type: &str, payload: &serde_json::Value) -> Result<()> {
    match payload.get("eventType").and_then(|v| v.as_str()) {
        Some(carried) if carried != event_type => Err(PipelineError::EventTypeMismatch {
            emitted: event_type.to_string(),
            payload: carried.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Emits a domain event payload.
///
/// Both strategies refuse a payload whose `eventType` field names another
/// event type.
#[async_trait]
pub trait EventEmitter: Send + Sync {
    async fn emit(
        &self,
        event_type: &str,
        payload: serde_json::Value,
        correlation: CorrelationContext,
    ) -> Result<EmitReceipt>;
}

/// Extension trait providing typed emission.
#[async_trait]
pub trait EventEmitterExt: EventEmitter {
    /// Serializes `payload` and emits it.
    async fn emit_event<T: Serialize + Sync>(
        &self,
        event_type: &str,
        payload: &T,
        correlation: CorrelationContext,
    ) -> Result<EmitReceipt> {
        let payload = serde_json::to_value(payload)?;
        self.emit(event_type, payload, correlation).await
    }
}

impl<E: EventEmitter + ?Sized> EventEmitterExt for E {}

/// Publishes events as envelopes on a topic.
///
/// Returns as soon as the channel accepts the message; whether subscribers
/// later succeed is not observed.
#[derive(Clone)]
pub struct PublishEmitter {
    publisher: Arc<dyn Publisher>,
    topic: String,
}

impl PublishEmitter {
    pub fn new(publisher: Arc<dyn Publisher>, topic: impl Into<String>) -> Self {
        Self {
            publisher,
            topic: topic.into(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[async_trait]
impl EventEmitter for PublishEmitter {
    #[tracing::instrument(skip(self, payload, correlation), fields(topic = %self.topic))]
    async fn emit(
        &self,
        event_type: &str,
        payload: serde_json::Value,
        correlation: CorrelationContext,
    ) -> Result<EmitReceipt> {
        check_event_type(event_type, &payload)?;
        let envelope = Envelope::wrap(event_type, &payload)?;
        let message_id = self.publisher.publish(&self.topic, &envelope).await?;

        tracing::info!(
            %message_id,
            request_id = %correlation.request_id,
            "event published"
        );
        Ok(EmitReceipt::Published(message_id))
    }
}

/// Emits events by synchronously invoking a named function.
///
/// Failures of the invocation are returned to the caller.
#[derive(Clone)]
pub struct InvokeEmitter {
    invoker: Arc<dyn Invoker>,
    target: String,
}

impl InvokeEmitter {
    pub fn new(invoker: Arc<dyn Invoker>, target: impl Into<String>) -> Self {
        Self {
            invoker,
            target: target.into(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

#[async_trait]
impl EventEmitter for InvokeEmitter {
    #[tracing::instrument(skip(self, payload, correlation), fields(invocation_target = %self.target))]
    async fn emit(
        &self,
        event_type: &str,
        payload: serde_json::Value,
        correlation: CorrelationContext,
    ) -> Result<EmitReceipt> {
        check_event_type(event_type, &payload)?;
        let response = self
            .invoker
            .invoke(&self.target, payload, correlation)
            .await?;

        tracing::info!(
            invocation_id = %response.invocation_id,
            response = %response.payload,
            "event function invoked"
        );
        Ok(EmitReceipt::Invoked(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{ChannelConfig, InMemoryChannel};
    use crate::invoke::{InvocationContext, InvocationTarget, LocalInvoker};
    use common::RequestId;
    use tokio::sync::Mutex;

    fn correlation() -> CorrelationContext {
        CorrelationContext::new(RequestId::new("req-1"))
    }

    #[derive(Default)]
    struct Capture {
        payloads: Mutex<Vec<serde_json::Value>>,
    }

    #[async_trait]
    impl InvocationTarget for Capture {
        async fn handle(
            &self,
            payload: serde_json::Value,
            _context: &InvocationContext,
        ) -> Result<serde_json::Value> {
            self.payloads.lock().await.push(payload);
            Ok(serde_json::json!("OK"))
        }
    }

    #[tokio::test]
    async fn publish_emitter_returns_message_id() {
        let channel = InMemoryChannel::new(ChannelConfig::default());
        channel.create_topic("order-events").await;
        let emitter = PublishEmitter::new(Arc::new(channel), "order-events");

        let receipt = emitter
            .emit_event("ORDER_CREATED", &serde_json::json!({ "orderId": "o-1" }), correlation())
            .await
            .unwrap();

        assert!(receipt.message_id().is_some());
    }

    #[tokio::test]
    async fn publish_emitter_fails_on_unknown_topic() {
        let channel = InMemoryChannel::new(ChannelConfig::default());
        let emitter = PublishEmitter::new(Arc::new(channel), "order-events");

        let result = emitter
            .emit("ORDER_CREATED", serde_json::Value::Null, correlation())
            .await;
        assert!(matches!(result, Err(PipelineError::UnknownTopic(_))));
    }

    #[tokio::test]
    async fn publish_emitter_rejects_mismatched_event_type() {
        let channel = InMemoryChannel::new(ChannelConfig::default());
        channel.create_topic("order-events").await;
        let emitter = PublishEmitter::new(Arc::new(channel), "order-events");

        let result = emitter
            .emit_event(
                "ORDER_DELETED",
                &serde_json::json!({ "eventType": "ORDER_CREATED" }),
                correlation(),
            )
            .await;
        assert!(matches!(result, Err(PipelineError::EventTypeMismatch { .. })));
    }

    #[tokio::test]
    async fn invoke_emitter_hands_payload_to_target() {
        let invoker = LocalInvoker::new();
        let capture = Arc::new(Capture::default());
        invoker.register("product-events", capture.clone()).await;
        let emitter = InvokeEmitter::new(Arc::new(invoker), "product-events");

        let receipt = emitter
            .emit_event("PRODUCT_CREATED", &serde_json::json!({ "productId": "p-1" }), correlation())
            .await
            .unwrap();

        let EmitReceipt::Invoked(response) = receipt else {
            panic!("expected an invocation receipt");
        };
        assert_eq!(response.payload, serde_json::json!("OK"));
        assert_eq!(
            *capture.payloads.lock().await,
            vec![serde_json::json!({ "productId": "p-1" })]
        );
    }

    #[tokio::test]
    async fn invoke_emitter_rejects_mismatched_event_type() {
        let invoker = LocalInvoker::new();
        let capture = Arc::new(Capture::default());
        invoker.register("product-events", capture.clone()).await;
        let emitter = InvokeEmitter::new(Arc::new(invoker), "product-events");

        let result = emitter
            .emit_event(
                "PRODUCT_DELETED",
                &serde_json::json!({ "eventType": "PRODUCT_CREATED", "productId": "p-1" }),
                correlation(),
            )
            .await;

        assert!(matches!(
            result,
            Err(PipelineError::EventTypeMismatch { ref emitted, ref payload })
                if emitted == "PRODUCT_DELETED" && payload == "PRODUCT_CREATED"
        ));
        assert!(capture.payloads.lock().await.is_empty());

        emitter
            .emit_event(
                "PRODUCT_CREATED",
                &serde_json::json!({ "eventType": "PRODUCT_CREATED", "productId": "p-1" }),
                correlation(),
            )
            .await
            .unwrap();
        assert_eq!(capture.payloads.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn invoke_emitter_propagates_missing_target() {
        let emitter = InvokeEmitter::new(Arc::new(LocalInvoker::new()), "product-events");
        let result = emitter
            .emit("PRODUCT_DELETED", serde_json::Value::Null, correlation())
            .await;
        assert!(matches!(result, Err(PipelineError::UnknownTarget(_))));
    }
}
