//! HTTP API for the e-commerce event pipeline.
//!
//! Provides REST endpoints for products and orders. Product mutations emit
//! their events by invoking the product-events function; order mutations
//! publish on the order-events topic. Structured logging (tracing) and
//! Prometheus metrics are wired in `main`.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use audit_log::AuditLogStore;
use axum::Router;
use axum::routing::get;
use common::SystemClock;
use domain::{InMemoryOrderRepository, InMemoryProductRepository};
use event_pipeline::{
    EventRepository, InMemoryChannel, InvokeEmitter, LocalInvoker, OrderEventsSubscriber,
    ProductEventsFunction, PublishEmitter,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::AppState;

/// Name under which the order-events recorder subscribes.
const ORDER_EVENTS_SUBSCRIBER: &str = "order-events-recorder";

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/products",
            get(routes::products::list).post(routes::products::create),
        )
        .route(
            "/products/{id}",
            get(routes::products::get)
                .put(routes::products::update)
                .delete(routes::products::delete),
        )
        .route(
            "/orders",
            get(routes::orders::list)
                .post(routes::orders::create)
                .delete(routes::orders::delete),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// Creates the default application state: in-memory entity stores, the
/// order-events channel with its recorder, and the product-events function.
///
/// Returns the channel as well so callers can wait for it to drain.
pub async fn create_default_state(
    config: &Config,
    audit_store: Arc<dyn AuditLogStore>,
) -> Result<(Arc<AppState>, InMemoryChannel), event_pipeline::PipelineError> {
    let clock = Arc::new(SystemClock);
    let repository = EventRepository::new(audit_store, clock.clone(), config.retention_policy());

    let channel = InMemoryChannel::with_clock(config.channel_config(), clock.clone());
    channel.create_topic(config.order_events_topic.as_str()).await;
    channel
        .subscribe(
            &config.order_events_topic,
            ORDER_EVENTS_SUBSCRIBER,
            Arc::new(OrderEventsSubscriber::new(repository.clone())),
        )
        .await?;

    let invoker = LocalInvoker::new();
    invoker
        .register(
            config.product_events_function.as_str(),
            Arc::new(ProductEventsFunction::new(repository)),
        )
        .await;

    let state = Arc::new(AppState {
        products: Arc::new(InMemoryProductRepository::new()),
        orders: Arc::new(InMemoryOrderRepository::with_clock(clock)),
        product_events: Arc::new(InvokeEmitter::new(
            Arc::new(invoker),
            config.product_events_function.as_str(),
        )),
        order_events: Arc::new(PublishEmitter::new(
            Arc::new(channel.clone()),
            config.order_events_topic.as_str(),
        )),
    });

    Ok((state, channel))
}
