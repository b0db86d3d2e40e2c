//! Domain layer for the e-commerce event pipeline.
//!
//! This crate provides:
//! - Product and order entities with their store traits and in-memory stores
//! - Order and product event payloads
//! - The transport envelope for events
//! - The order builder and all-or-nothing product resolution

pub mod envelope;
pub mod error;
pub mod order;
pub mod product;
pub mod value_objects;

pub use envelope::Envelope;
pub use error::{DomainError, Result};
pub use order::{
    Billing, Carrier, InMemoryOrderRepository, NewOrder, Order, OrderBuilder, OrderEvent,
    OrderEventType, OrderProduct, OrderRepository, OrderRequest, PaymentType, Shipping,
    ShippingType,
};
pub use product::{
    InMemoryProductRepository, Product, ProductData, ProductEvent, ProductEventType,
    ProductRepository, ProductRepositoryExt, ProductResolution,
};
pub use value_objects::{InvalidAmount, Money};
