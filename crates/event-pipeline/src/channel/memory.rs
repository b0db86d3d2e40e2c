use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Clock, MessageId, SystemClock};
use domain::Envelope;
use tokio::sync::{Mutex, Notify, RwLock, mpsc};

use super::{Delivery, Publisher, Subscriber};
use crate::{PipelineError, Result};

/// Delivery settings of an [`InMemoryChannel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Deliveries attempted per message and subscriber, including the first.
    pub max_attempts: u32,

    /// Wait before the first redelivery. Doubles on each further attempt.
    pub retry_backoff: Duration,

    /// Dead letters kept; the oldest is dropped once the limit is reached.
    pub max_dead_letters: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_backoff: Duration::from_millis(100),
            max_dead_letters: 1000,
        }
    }
}

/// A message a subscriber could not handle within `max_attempts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadLetter {
    pub topic: String,
    pub subscriber: String,
    pub message_id: MessageId,
    pub message: String,
    pub attempts: u32,
    pub error: String,
}

#[derive(Debug, Clone)]
struct Queued {
    topic: String,
    message_id: MessageId,
    timestamp: DateTime<Utc>,
    message: String,
}

struct ChannelInner {
    topics: RwLock<HashMap<String, Vec<mpsc::UnboundedSender<Queued>>>>,
    config: ChannelConfig,
    clock: Arc<dyn Clock>,
    in_flight: AtomicUsize,
    idle: Notify,
    dead_letters: Mutex<VecDeque<DeadLetter>>,
}

/// In-process publish/subscribe channel.
///
/// Every subscriber owns a FIFO queue drained by its own task, so a slow or
/// failing subscriber never delays the others. Messages published by one
/// producer reach each subscriber in publish order. Failed deliveries are
/// retried with exponential backoff; messages that exhaust their attempts
/// are kept as dead letters, up to `max_dead_letters`.
///
/// Subscribing spawns a task, so it must happen inside a tokio runtime.
#[derive(Clone)]
pub struct InMemoryChannel {
    inner: Arc<ChannelInner>,
}

impl InMemoryChannel {
    pub fn new(config: ChannelConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a channel stamping deliveries with `clock`.
    pub fn with_clock(config: ChannelConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(ChannelInner {
                topics: RwLock::new(HashMap::new()),
                config: ChannelConfig {
                    max_attempts: config.max_attempts.max(1),
                    ..config
                },
                clock,
                in_flight: AtomicUsize::new(0),
                idle: Notify::new(),
                dead_letters: Mutex::new(VecDeque::new()),
            }),
        }
    }

    /// Creates `topic` if it does not exist yet.
    pub async fn create_topic(&self, topic: impl Into<String>) {
        self.inner
            .topics
            .write()
            .await
            .entry(topic.into())
            .or_default();
    }

    /// Attaches `subscriber` to `topic` under `name`.
    ///
    /// Only messages published after this call are delivered to it.
    pub async fn subscribe(
        &self,
        topic: &str,
        name: impl Into<String>,
        subscriber: Arc<dyn Subscriber>,
    ) -> Result<()> {
        let name = name.into();
        let mut topics = self.inner.topics.write().await;
        let queues = topics
            .get_mut(topic)
            .ok_or_else(|| PipelineError::UnknownTopic(topic.to_string()))?;

        let (tx, mut rx) = mpsc::unbounded_channel::<Queued>();
        queues.push(tx);

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            while let Some(queued) = rx.recv().await {
                inner.deliver(&name, subscriber.as_ref(), queued).await;
                inner.finish_one();
            }
        });

        tracing::info!(topic, "subscriber attached");
        Ok(())
    }

    /// Waits until every published message has been delivered or dead-lettered.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.inner.in_flight.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Returns the number of messages queued or being delivered.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    /// Returns the messages no subscriber attempt could handle, oldest first.
    pub async fn dead_letters(&self) -> Vec<DeadLetter> {
        self.inner.dead_letters.lock().await.iter().cloned().collect()
    }

    /// Removes and returns every dead letter, oldest first.
    pub async fn take_dead_letters(&self) -> Vec<DeadLetter> {
        self.inner.dead_letters.lock().await.drain(..).collect()
    }
}

impl ChannelInner {
    async fn deliver(&self, subscriber_name: &str, subscriber: &dyn Subscriber, queued: Queued) {
        let mut delivery = Delivery {
            message_id: queued.message_id,
            timestamp: queued.timestamp,
            attempt: 1,
            message: queued.message,
        };

        loop {
            match subscriber.on_message(&delivery).await {
                Ok(()) => {
                    metrics::counter!("channel_deliveries_total").increment(1);
                    return;
                }
                Err(e) if delivery.attempt < self.config.max_attempts => {
                    let backoff = self
                        .config
                        .retry_backoff
                        .saturating_mul(2u32.saturating_pow(delivery.attempt - 1));
                    tracing::warn!(
                        topic = %queued.topic,
                        subscriber = subscriber_name,
                        message_id = %delivery.message_id,
                        attempt = delivery.attempt,
                        error = %e,
                        "delivery failed, retrying"
                    );
                    metrics::counter!("channel_redeliveries_total").increment(1);
                    tokio::time::sleep(backoff).await;
                    delivery.attempt += 1;
                }
                Err(e) => {
                    tracing::error!(
                        topic = %queued.topic,
                        subscriber = subscriber_name,
                        message_id = %delivery.message_id,
                        attempts = delivery.attempt,
                        error = %e,
                        "delivery failed, dead-lettering message"
                    );
                    metrics::counter!("channel_dead_letters_total").increment(1);
                    let mut dead_letters = self.dead_letters.lock().await;
                    if self.config.max_dead_letters == 0 {
                        return;
                    }
                    if dead_letters.len() >= self.config.max_dead_letters {
                        dead_letters.pop_front();
                    }
                    dead_letters.push_back(DeadLetter {
                        topic: queued.topic,
                        subscriber: subscriber_name.to_string(),
                        message_id: delivery.message_id,
                        message: delivery.message,
                        attempts: delivery.attempt,
                        error: e.to_string(),
                    });
                    return;
                }
            }
        }
    }

    fn finish_one(&self) {
        if self.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.idle.notify_waiters();
        }
    }
}

#[async_trait]
impl Publisher for InMemoryChannel {
    #[tracing::instrument(skip(self, envelope), fields(event_type = %envelope.event_type))]
    async fn publish(&self, topic: &str, envelope: &Envelope) -> Result<MessageId> {
        let message = envelope.to_message()?;
        let topics = self.inner.topics.read().await;
        let queues = topics
            .get(topic)
            .ok_or_else(|| PipelineError::UnknownTopic(topic.to_string()))?;

        let message_id = MessageId::new();
        let queued = Queued {
            topic: topic.to_string(),
            message_id,
            timestamp: self.inner.clock.now(),
            message,
        };

        for queue in queues {
            self.inner.in_flight.fetch_add(1, Ordering::AcqRel);
            if queue.send(queued.clone()).is_err() {
                self.inner.finish_one();
                tracing::warn!(%message_id, "subscriber queue closed, message dropped");
            }
        }

        metrics::counter!("channel_messages_published_total").increment(1);
        tracing::debug!(%message_id, subscribers = queues.len(), "message published");
        Ok(message_id)
    }
}
