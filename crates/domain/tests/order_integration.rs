//! Integration tests for placing orders against the product catalogue.
//!
//! These tests exercise resolution, building and storage together, the way
//! the order handler drives them.

use std::sync::Arc;

use common::{ManualClock, ProductId, RequestId};
use domain::{
    Carrier, DomainError, Envelope, InMemoryOrderRepository, InMemoryProductRepository, Money,
    OrderBuilder, OrderEvent, OrderEventType, OrderRepository, OrderRequest, PaymentType,
    ProductData, ProductRepository, ProductRepositoryExt, ProductResolution, Shipping,
    ShippingType,
};

fn product_data(code: &str, price: f64) -> ProductData {
    ProductData {
        name: format!("Product {code}"),
        code: code.to_string(),
        price: Money::from_decimal(price).unwrap(),
        model: "M1".to_string(),
        product_url: None,
    }
}

fn order_request(email: &str, ids: Vec<ProductId>) -> OrderRequest {
    OrderRequest {
        email: email.to_string(),
        product_ids: ids,
        payment: PaymentType::CreditCard,
        shipping: Shipping {
            shipping_type: ShippingType::Urgent,
            carrier: Carrier::Fedex,
        },
    }
}

/// Resolves, builds and stores an order, mirroring the create-order flow.
async fn place_order(
    products: &InMemoryProductRepository,
    orders: &InMemoryOrderRepository,
    request: &OrderRequest,
) -> Result<domain::Order, DomainError> {
    request.validate()?;
    match products.resolve(&request.product_ids).await? {
        ProductResolution::AllResolved(resolved) => {
            orders.create(OrderBuilder::build(request, &resolved)?).await
        }
        ProductResolution::SomeMissing(missing) => Err(DomainError::validation(format!(
            "Products not found: {missing:?}"
        ))),
    }
}

mod placing_orders {
    use super::*;

    #[tokio::test]
    async fn order_totals_resolved_prices() {
        let products = InMemoryProductRepository::new();
        let orders = InMemoryOrderRepository::new();
        let p1 = products.create(product_data("A", 10.0)).await.unwrap();
        let p2 = products.create(product_data("B", 15.0)).await.unwrap();

        let request = order_request("a@b.com", vec![p1.id.clone(), p2.id.clone()]);
        let order = place_order(&products, &orders, &request).await.unwrap();

        assert_eq!(order.billing.total_price.as_decimal(), 25.0);
        assert_eq!(order.product_codes(), vec!["A".to_string(), "B".to_string()]);
        assert_eq!(orders.get("a@b.com", &order.id).await.unwrap(), Some(order));
    }

    #[tokio::test]
    async fn missing_product_stores_nothing() {
        let products = InMemoryProductRepository::new();
        let orders = InMemoryOrderRepository::new();
        let p1 = products.create(product_data("A", 10.0)).await.unwrap();

        let request = order_request("a@b.com", vec![p1.id, ProductId::new("ghost")]);
        let result = place_order(&products, &orders, &request).await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert!(orders.is_empty().await);
    }

    #[tokio::test]
    async fn product_changes_do_not_touch_placed_orders() {
        let products = InMemoryProductRepository::new();
        let orders = InMemoryOrderRepository::new();
        let p1 = products.create(product_data("A", 10.0)).await.unwrap();

        let request = order_request("a@b.com", vec![p1.id.clone()]);
        let order = place_order(&products, &orders, &request).await.unwrap();

        products
            .update(&p1.id, product_data("A", 99.0))
            .await
            .unwrap();

        let stored = orders.get("a@b.com", &order.id).await.unwrap().unwrap();
        assert_eq!(stored.products[0].price, Money::from_cents(1000));
        assert_eq!(stored.billing.total_price, Money::from_cents(1000));
    }
}

mod order_events {
    use super::*;

    #[tokio::test]
    async fn created_event_round_trips_through_envelope() {
        let clock = ManualClock::default();
        let products = InMemoryProductRepository::new();
        let orders = InMemoryOrderRepository::with_clock(Arc::new(clock));
        let p1 = products.create(product_data("A", 10.0)).await.unwrap();

        let request = order_request("a@b.com", vec![p1.id.clone(), p1.id.clone()]);
        let order = place_order(&products, &orders, &request).await.unwrap();

        let event = OrderEvent::from_order(&order, RequestId::new("req-1"));
        let message = Envelope::wrap(OrderEventType::Created.as_str(), &event)
            .unwrap()
            .to_message()
            .unwrap();

        let received = Envelope::from_message(&message).unwrap();
        assert_eq!(received.event_type, "ORDER_CREATED");

        let payload: OrderEvent = received.open().unwrap();
        assert_eq!(payload.order_id, order.id);
        assert_eq!(payload.product_codes, vec!["A".to_string(), "A".to_string()]);
        assert_eq!(payload.billing.total_price, Money::from_cents(2000));
    }
}
