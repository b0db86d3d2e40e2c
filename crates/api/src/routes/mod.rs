pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;

use std::sync::Arc;

use axum::http::HeaderMap;
use common::RequestId;
use domain::{OrderRepository, ProductRepository};
use event_pipeline::{CorrelationContext, EventEmitter};

/// Header carrying the correlation id of a request.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Header naming the user behind a product mutation.
pub const USER_EMAIL_HEADER: &str = "x-user-email";

const ANONYMOUS_USER: &str = "anonymous";

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub products: Arc<dyn ProductRepository>,
    pub orders: Arc<dyn OrderRepository>,
    /// Emits product events by synchronous invocation.
    pub product_events: Arc<dyn EventEmitter>,
    /// Emits order events by publishing on the order-events topic.
    pub order_events: Arc<dyn EventEmitter>,
}

/// Correlation context of the request, from its `x-request-id` header.
///
/// The request-id middleware sets the header on every request, so the
/// generated fallback only applies when handlers run without it.
pub(crate) fn correlation(headers: &HeaderMap) -> CorrelationContext {
    let request_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(RequestId::new)
        .unwrap_or_else(RequestId::generate);
    CorrelationContext::new(request_id)
}

/// Email of the acting user, from the `x-user-email` header.
pub(crate) fn acting_user(headers: &HeaderMap) -> String {
    headers
        .get(USER_EMAIL_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(ANONYMOUS_USER)
        .to_string()
}
