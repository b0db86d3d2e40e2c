//! Product domain events.

use common::{ProductId, RequestId};
use serde::{Deserialize, Serialize};

use super::Product;
use crate::value_objects::Money;

/// Lifecycle events of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductEventType {
    #[serde(rename = "PRODUCT_CREATED")]
    Created,
    #[serde(rename = "PRODUCT_UPDATED")]
    Updated,
    #[serde(rename = "PRODUCT_DELETED")]
    Deleted,
}

impl ProductEventType {
    /// Returns the wire name of the event type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductEventType::Created => "PRODUCT_CREATED",
            ProductEventType::Updated => "PRODUCT_UPDATED",
            ProductEventType::Deleted => "PRODUCT_DELETED",
        }
    }
}

impl std::fmt::Display for ProductEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload describing one product lifecycle event.
///
/// Unlike order events, the event type travels inside the payload because
/// product events are delivered by direct invocation rather than in an
/// envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductEvent {
    /// Correlation id of the triggering request.
    pub request_id: RequestId,

    /// What happened to the product.
    pub event_type: ProductEventType,

    /// The product's identifier.
    pub product_id: ProductId,

    /// The product's business code.
    pub product_code: String,

    /// The product's price at the time of the event.
    pub product_price: Money,

    /// Email of the acting user.
    pub email: String,
}

impl ProductEvent {
    /// Builds the event payload for `product`.
    pub fn new(
        event_type: ProductEventType,
        product: &Product,
        email: impl Into<String>,
        request_id: RequestId,
    ) -> Self {
        Self {
            request_id,
            event_type,
            product_id: product.id.clone(),
            product_code: product.code.clone(),
            product_price: product.price,
            email: email.into(),
        }
    }
}
