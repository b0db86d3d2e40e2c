//! Order endpoints.
//!
//! Order events are published on the order-events topic; recording them
//! happens asynchronously and its outcome never reaches the caller.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use common::OrderId;
use domain::{
    DomainError, Order, OrderBuilder, OrderEvent, OrderEventType, OrderRequest, ProductRepositoryExt,
    ProductResolution,
};
use event_pipeline::EventEmitterExt;
use serde::Deserialize;

use super::{AppState, correlation};
use crate::error::ApiError;

/// Query parameters accepted by `/orders`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQuery {
    pub email: Option<String>,
    pub order_id: Option<String>,
}

async fn publish_order_event(
    state: &AppState,
    headers: &HeaderMap,
    event_type: OrderEventType,
    order: &Order,
) -> Result<(), ApiError> {
    let correlation = correlation(headers);
    let event = OrderEvent::from_order(order, correlation.request_id.clone());

    let receipt = state
        .order_events
        .emit_event(event_type.as_str(), &event, correlation)
        .await?;

    tracing::info!(
        %event_type,
        order_id = %order.id,
        message_id = ?receipt.message_id(),
        "order event sent"
    );
    Ok(())
}

/// GET /orders — all orders, a customer's orders (`?email`) or one order
/// (`?email&orderId`).
#[tracing::instrument(skip(state, query))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    query: Result<Query<OrderQuery>, QueryRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Query(query) = query?;

    let body = match (query.email, query.order_id) {
        (None, None) => serde_json::to_value(state.orders.get_all().await?),
        (Some(email), None) => serde_json::to_value(state.orders.get_by_email(&email).await?),
        (Some(email), Some(order_id)) => {
            let order = state
                .orders
                .get(&email, &OrderId::new(order_id.as_str()))
                .await?
                .ok_or_else(|| DomainError::not_found("Order", order_id))?;
            serde_json::to_value(order)
        }
        (None, Some(_)) => {
            return Err(ApiError::BadRequest(
                "orderId requires the email parameter".to_string(),
            ));
        }
    }
    .map_err(DomainError::from)?;

    Ok(Json(body))
}

/// POST /orders — place an order for existing products.
///
/// Nothing is stored or published unless every requested product exists.
#[tracing::instrument(skip(state, headers, payload))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<OrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let products = match state.products.resolve(&request.product_ids).await? {
        ProductResolution::AllResolved(products) => products,
        ProductResolution::SomeMissing(missing) => {
            let ids: Vec<&str> = missing.iter().map(|id| id.as_str()).collect();
            return Err(ApiError::BadRequest(format!(
                "Some product was not found: {}",
                ids.join(", ")
            )));
        }
    };

    let new_order = OrderBuilder::build(&request, &products)?;
    let order = state.orders.create(new_order).await?;
    publish_order_event(&state, &headers, OrderEventType::Created, &order).await?;

    metrics::counter!("orders_created_total").increment(1);
    Ok((StatusCode::CREATED, Json(order)))
}

/// DELETE /orders?email&orderId — delete one order and return it.
#[tracing::instrument(skip(state, headers, query))]
pub async fn delete(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    query: Result<Query<OrderQuery>, QueryRejection>,
) -> Result<Json<Order>, ApiError> {
    let Query(query) = query?;
    let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    let (Some(email), Some(order_id)) = (present(query.email), present(query.order_id)) else {
        return Err(ApiError::BadRequest(
            "email and orderId are required".to_string(),
        ));
    };

    let order = state
        .orders
        .delete(&email, &OrderId::new(order_id))
        .await?;
    publish_order_event(&state, &headers, OrderEventType::Deleted, &order).await?;

    metrics::counter!("orders_deleted_total").increment(1);
    Ok(Json(order))
}
