use super::{Billing, NewOrder, OrderProduct, OrderRequest};
use crate::error::{DomainError, Result};
use crate::product::Product;
use crate::value_objects::Money;

/// Assembles an order from a request and its resolved products.
pub struct OrderBuilder;

impl OrderBuilder {
    /// Builds the order for `request`.
    ///
    /// `products` must be the resolution of `request.product_ids`, in the
    /// same order. The total is the sum of the product prices; one line is
    /// snapshotted per product. Performs no I/O.
    ///
    /// Fails with a validation error when the total cannot be represented.
    pub fn build(request: &OrderRequest, products: &[Product]) -> Result<NewOrder> {
        let lines: Vec<OrderProduct> = products
            .iter()
            .map(|product| OrderProduct {
                code: product.code.clone(),
                price: product.price,
            })
            .collect();

        let total_price = Money::checked_sum(lines.iter().map(|line| line.price))
            .ok_or_else(|| DomainError::validation("order total is too large"))?;

        Ok(NewOrder {
            email: request.email.clone(),
            shipping: request.shipping,
            billing: Billing {
                payment: request.payment,
                total_price,
            },
            products: lines,
        })
    }
}
