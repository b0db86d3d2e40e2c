//! Publish/subscribe fan-out of envelopes.

mod memory;

pub use memory::{ChannelConfig, DeadLetter, InMemoryChannel};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::MessageId;
use domain::Envelope;

use crate::Result;

/// One delivery of a published message to one subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Id assigned when the message was published. Shared by every delivery
    /// and redelivery of the same message.
    pub message_id: MessageId,

    /// When the message was published.
    pub timestamp: DateTime<Utc>,

    /// 1 for the first delivery, incremented on each redelivery.
    pub attempt: u32,

    /// The envelope as message text.
    pub message: String,
}

/// Publishes envelopes to named topics.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publishes `envelope` on `topic` and returns the assigned message id.
    ///
    /// Returns once the channel has accepted the message. Delivery to
    /// subscribers happens afterwards and its outcome is not reported back.
    async fn publish(&self, topic: &str, envelope: &Envelope) -> Result<MessageId>;
}

/// Receives messages from a topic.
#[async_trait]
pub trait Subscriber: Send + Sync {
    /// Handles one delivery. An error asks the channel to redeliver.
    async fn on_message(&self, delivery: &Delivery) -> Result<()>;
}
