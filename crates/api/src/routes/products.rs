//! Product catalogue endpoints.
//!
//! Every mutation hands its event to the product-events function and only
//! replies once that invocation has returned.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use common::ProductId;
use domain::{DomainError, Product, ProductData, ProductEvent, ProductEventType};
use event_pipeline::EventEmitterExt;

use super::{AppState, acting_user, correlation};
use crate::error::ApiError;

async fn emit_product_event(
    state: &AppState,
    headers: &HeaderMap,
    event_type: ProductEventType,
    product: &Product,
) -> Result<(), ApiError> {
    let correlation = correlation(headers);
    let event = ProductEvent::new(
        event_type,
        product,
        acting_user(headers),
        correlation.request_id.clone(),
    );

    let receipt = state
        .product_events
        .emit_event(event_type.as_str(), &event, correlation)
        .await?;

    tracing::info!(
        %event_type,
        product_id = %product.id,
        receipt = ?receipt,
        "product event function returned"
    );
    Ok(())
}

/// GET /products — list every product.
#[tracing::instrument(skip(state))]
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(state.products.get_all().await?))
}

/// GET /products/{id} — load one product.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let product = state
        .products
        .get(&ProductId::new(id.as_str()))
        .await?
        .ok_or_else(|| DomainError::not_found("Product", id))?;
    Ok(Json(product))
}

/// POST /products — create a product under a generated id.
#[tracing::instrument(skip(state, headers, payload))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<ProductData>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let Json(data) = payload?;
    data.validate()?;

    let product = state.products.create(data).await?;
    emit_product_event(&state, &headers, ProductEventType::Created, &product).await?;

    metrics::counter!("products_created_total").increment(1);
    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /products/{id} — replace an existing product.
#[tracing::instrument(skip(state, headers, payload))]
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<ProductData>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(data) = payload?;
    data.validate()?;

    let product = state.products.update(&ProductId::new(id), data).await?;
    emit_product_event(&state, &headers, ProductEventType::Updated, &product).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /products/{id} — remove a product.
#[tracing::instrument(skip(state, headers))]
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let product = state.products.delete(&ProductId::new(id)).await?;
    emit_product_event(&state, &headers, ProductEventType::Deleted, &product).await?;

    Ok(StatusCode::NO_CONTENT)
}
