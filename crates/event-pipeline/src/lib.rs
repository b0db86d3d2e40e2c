//! Domain event pipeline.
//!
//! Turns product and order mutations into audit records:
//! - [`emitter`]: the two emission strategies behind [`EventEmitter`]
//! - [`channel`]: publish/subscribe fan-out with retries and dead letters
//! - [`invoke`]: synchronous invocation of named functions
//! - [`consumers`]: the subscriber and function that record events
//! - [`repository`]: translation of payloads into audit records

pub mod channel;
pub mod consumers;
pub mod emitter;
pub mod error;
pub mod invoke;
pub mod repository;

pub use channel::{ChannelConfig, DeadLetter, Delivery, InMemoryChannel, Publisher, Subscriber};
pub use consumers::{OrderEventsSubscriber, ProductEventsFunction};
pub use emitter::{EmitReceipt, EventEmitter, EventEmitterExt, InvokeEmitter, PublishEmitter};
pub use error::{PipelineError, Result};
pub use invoke::{
    CorrelationContext, InvocationContext, InvocationResponse, InvocationTarget, Invoker,
    LocalInvoker,
};
pub use repository::{
    EventRepository, RetentionPolicy, order_partition_key, product_partition_key, sort_key,
};
