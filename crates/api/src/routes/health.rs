//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use super::AppState;
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub products: usize,
    pub orders: usize,
}

/// GET /health — reports status and the size of the entity stores.
///
/// Fails with 500 when either store cannot be read.
pub async fn check(State(state): State<Arc<AppState>>) -> Result<Json<HealthResponse>, ApiError> {
    let products = state.products.get_all().await?.len();
    let orders = state.orders.get_all().await?.len();

    Ok(Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        products,
        orders,
    }))
}
