use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::ProductId;
use tokio::sync::RwLock;

use super::{Product, ProductData};
use crate::error::{DomainError, Result};

/// Storage for the product catalogue.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Returns every product.
    async fn get_all(&self) -> Result<Vec<Product>>;

    /// Returns one product, or `None` if absent.
    async fn get(&self, id: &ProductId) -> Result<Option<Product>>;

    /// Returns the products matching `ids` that exist, in no particular
    /// order. Duplicate and unknown ids are ignored.
    async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>>;

    /// Stores a new product under a generated id.
    async fn create(&self, data: ProductData) -> Result<Product>;

    /// Replaces an existing product's fields.
    ///
    /// Fails with `WriteFailure` when no product with `id` exists.
    async fn update(&self, id: &ProductId, data: ProductData) -> Result<Product>;

    /// Removes a product and returns its last state.
    ///
    /// Fails with `WriteFailure` when no product with `id` exists.
    async fn delete(&self, id: &ProductId) -> Result<Product>;
}

/// Outcome of resolving a list of requested product ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductResolution {
    /// Every id resolved; products are in requested order.
    AllResolved(Vec<Product>),

    /// At least one id did not resolve. Lists the unresolved ids once each,
    /// in the order they were first requested.
    SomeMissing(Vec<ProductId>),
}

/// Extension trait providing convenience methods for product repositories.
#[async_trait]
pub trait ProductRepositoryExt: ProductRepository {
    /// Resolves `ids` all-or-nothing.
    ///
    /// A repeated id yields a repeated product, so an order may contain the
    /// same product more than once.
    async fn resolve(&self, ids: &[ProductId]) -> Result<ProductResolution> {
        let found: HashMap<ProductId, Product> = self
            .get_many(ids)
            .await?
            .into_iter()
            .map(|product| (product.id.clone(), product))
            .collect();

        let mut resolved = Vec::with_capacity(ids.len());
        let mut missing: Vec<ProductId> = Vec::new();

        for id in ids {
            match found.get(id) {
                Some(product) => resolved.push(product.clone()),
                None if !missing.contains(id) => missing.push(id.clone()),
                None => {}
            }
        }

        if missing.is_empty() {
            Ok(ProductResolution::AllResolved(resolved))
        } else {
            tracing::debug!(?missing, "product resolution incomplete");
            Ok(ProductResolution::SomeMissing(missing))
        }
    }
}

impl<T: ProductRepository + ?Sized> ProductRepositoryExt for T {}

/// In-memory product repository.
#[derive(Clone, Default)]
pub struct InMemoryProductRepository {
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a product as-is, keeping its id. Replaces any existing entry.
    pub async fn insert(&self, product: Product) {
        self.products
            .write()
            .await
            .insert(product.id.clone(), product);
    }

    pub async fn len(&self) -> usize {
        self.products.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.products.read().await.is_empty()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn get_all(&self) -> Result<Vec<Product>> {
        let mut products: Vec<_> = self.products.read().await.values().cloned().collect();
        products.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(products)
    }

    async fn get(&self, id: &ProductId) -> Result<Option<Product>> {
        Ok(self.products.read().await.get(id).cloned())
    }

    async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
        let products = self.products.read().await;
        let mut found: Vec<Product> = Vec::new();
        for id in ids {
            if let Some(product) = products.get(id)
                && !found.iter().any(|p| &p.id == id)
            {
                found.push(product.clone());
            }
        }
        Ok(found)
    }

    async fn create(&self, data: ProductData) -> Result<Product> {
        let product = data.into_product(ProductId::generate());
        self.insert(product.clone()).await;
        Ok(product)
    }

    async fn update(&self, id: &ProductId, data: ProductData) -> Result<Product> {
        let mut products = self.products.write().await;
        let Some(slot) = products.get_mut(id) else {
            return Err(DomainError::missing_on_write("Product", id.as_str()));
        };
        *slot = data.into_product(id.clone());
        Ok(slot.clone())
    }

    async fn delete(&self, id: &ProductId) -> Result<Product> {
        self.products
            .write()
            .await
            .remove(id)
            .ok_or_else(|| DomainError::missing_on_write("Product", id.as_str()))
    }
}
