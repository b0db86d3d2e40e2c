//! Order domain events.

use common::{OrderId, RequestId};
use serde::{Deserialize, Serialize};

use super::{Billing, Order, Shipping};

/// Lifecycle events of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderEventType {
    #[serde(rename = "ORDER_CREATED")]
    Created,
    #[serde(rename = "ORDER_DELETED")]
    Deleted,
}

impl OrderEventType {
    /// Returns the wire name of the event type.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderEventType::Created => "ORDER_CREATED",
            OrderEventType::Deleted => "ORDER_DELETED",
        }
    }
}

impl std::fmt::Display for OrderEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload describing one order lifecycle event.
///
/// The event type is not part of the payload; it travels in the envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEvent {
    pub email: String,
    pub order_id: OrderId,
    pub billing: Billing,
    pub shipping: Shipping,
    pub request_id: RequestId,
    pub product_codes: Vec<String>,
}

impl OrderEvent {
    /// Builds the event payload for `order`.
    pub fn from_order(order: &Order, request_id: RequestId) -> Self {
        Self {
            email: order.email.clone(),
            order_id: order.id.clone(),
            billing: order.billing,
            shipping: order.shipping,
            request_id,
            product_codes: order.product_codes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{Carrier, OrderProduct, PaymentType, ShippingType};
    use crate::value_objects::Money;
    use chrono::Utc;

    #[test]
    fn payload_carries_order_facts() {
        let order = Order {
            email: "a@b.com".to_string(),
            id: OrderId::new("o-1"),
            created_at: Utc::now(),
            shipping: Shipping {
                shipping_type: ShippingType::Urgent,
                carrier: Carrier::Fedex,
            },
            billing: Billing {
                payment: PaymentType::Cash,
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
        };

        let event = OrderEvent::from_order(&order, RequestId::new("req-9"));
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["email"], "a@b.com");
        assert_eq!(json["orderId"], "o-1");
        assert_eq!(json["requestId"], "req-9");
        assert_eq!(json["productCodes"], serde_json::json!(["A", "B"]));
        assert_eq!(json["billing"]["totalPrice"], 25.0);
        assert_eq!(json["shipping"]["carrier"], "FEDEX");
        assert!(json.get("eventType").is_none());
    }

    #[test]
    fn event_type_wire_names() {
        assert_eq!(
            serde_json::to_value(OrderEventType::Created).unwrap(),
            "ORDER_CREATED"
        );
        assert_eq!(OrderEventType::Deleted.to_string(), "ORDER_DELETED");
    }
}
