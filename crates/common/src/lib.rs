//! Identifiers and time source shared by every crate in the workspace.

pub mod clock;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use types::{MessageId, OrderId, ProductId, RequestId};
