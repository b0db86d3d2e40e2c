//! Transport wrapper for domain events.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// An event-type discriminator plus an opaque serialized payload.
///
/// The envelope is what travels over the channel. Transport never looks
/// inside `data`; only the receiving subscriber knows which payload type to
/// expect for a given `event_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// The event type (e.g. "ORDER_CREATED").
    pub event_type: String,

    /// The payload serialized as JSON text.
    pub data: String,
}

impl Envelope {
    /// Serializes `payload` and wraps it with `event_type`.
    pub fn wrap<T: Serialize>(
        event_type: impl Into<String>,
        payload: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            event_type: event_type.into(),
            data: serde_json::to_string(payload)?,
        })
    }

    /// Parses the payload as `T`.
    pub fn open<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.data)
    }

    /// Renders the envelope as message text for transport.
    pub fn to_message(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses message text received from transport.
    pub fn from_message(message: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(message)
    }
}
