//! Orders and related types.

mod builder;
mod events;
mod repository;

pub use builder::OrderBuilder;
pub use events::{OrderEvent, OrderEventType};
pub use repository::{InMemoryOrderRepository, OrderRepository};

use chrono::{DateTime, Utc};
use common::{OrderId, ProductId};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};
use crate::value_objects::Money;

/// Delivery speed selected by the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShippingType {
    Urgent,
    Economic,
}

/// Carrier selected by the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Carrier {
    Correios,
    Fedex,
}

/// Payment method selected by the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    Cash,
    DebitCard,
    CreditCard,
}

/// Shipping selections of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipping {
    #[serde(rename = "type")]
    pub shipping_type: ShippingType,
    pub carrier: Carrier,
}

/// Billing information of an order. The total is always computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Billing {
    pub payment: PaymentType,
    pub total_price: Money,
}

/// Snapshot of a product taken when the order was placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderProduct {
    pub code: String,
    pub price: Money,
}

/// A stored customer order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Customer email; orders are partitioned by it.
    pub email: String,

    /// Generated identifier, unique per customer.
    pub id: OrderId,

    /// Creation time, serialized as epoch milliseconds.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,

    pub shipping: Shipping,
    pub billing: Billing,
    pub products: Vec<OrderProduct>,
}

impl Order {
    /// Returns the codes of the ordered products, in order.
    pub fn product_codes(&self) -> Vec<String> {
        self.products.iter().map(|p| p.code.clone()).collect()
    }
}

/// An order built from a request but not yet stored.
///
/// The store assigns the id and creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub email: String,
    pub shipping: Shipping,
    pub billing: Billing,
    pub products: Vec<OrderProduct>,
}

impl NewOrder {
    /// Attaches identity, producing the stored entity.
    pub fn into_order(self, id: OrderId, created_at: DateTime<Utc>) -> Order {
        Order {
            email: self.email,
            id,
            created_at,
            shipping: self.shipping,
            billing: self.billing,
            products: self.products,
        }
    }
}

/// Client request to place an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub email: String,
    pub product_ids: Vec<ProductId>,
    pub payment: PaymentType,
    pub shipping: Shipping,
}

impl OrderRequest {
    /// Checks the fields an order cannot be placed without.
    pub fn validate(&self) -> Result<()> {
        if self.email.trim().is_empty() {
            return Err(DomainError::validation("Customer email is required"));
        }
        if self.product_ids.is_empty() {
            return Err(DomainError::validation(
                "An order needs at least one product",
            ));
        }
        Ok(())
    }
}
