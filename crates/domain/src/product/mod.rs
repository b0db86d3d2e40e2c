//! Product entity and related types.

mod events;
mod repository;

pub use events::{ProductEvent, ProductEventType};
pub use repository::{
    InMemoryProductRepository, ProductRepository, ProductRepositoryExt, ProductResolution,
};

use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};
use crate::value_objects::Money;

/// A product in the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// System-generated identifier.
    pub id: ProductId,

    /// Human-readable name.
    pub name: String,

    /// Business code, used to key the product's audit history.
    pub code: String,

    /// Unit price.
    pub price: Money,

    /// Model designator.
    pub model: String,

    /// Optional media URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_url: Option<String>,
}

/// Product fields supplied by a client when creating or updating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductData {
    pub name: String,
    pub code: String,
    pub price: Money,
    pub model: String,
    #[serde(default)]
    pub product_url: Option<String>,
}

impl ProductData {
    /// Checks the fields a product cannot exist without.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("Product name is required"));
        }
        if self.code.trim().is_empty() {
            return Err(DomainError::validation("Product code is required"));
        }
        if self.price.is_negative() {
            return Err(DomainError::validation(format!(
                "Invalid price: {} (must not be negative)",
                self.price
            )));
        }
        Ok(())
    }

    /// Attaches an identifier, producing the stored entity.
    pub fn into_product(self, id: ProductId) -> Product {
        Product {
            id,
            name: self.name,
            code: self.code,
            price: self.price,
            model: self.model,
            product_url: self.product_url,
        }
    }
}
