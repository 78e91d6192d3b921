use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use warefront_catalog::CatalogLookup;
use warefront_core::{CustomerId, OrderId, ProductId, StoreId};

use crate::order::{Order, OrderLine};

/// Why a requested order could not be assembled.
///
/// All variants are recoverable: the caller corrects the request and retries.
/// Assembly never mutates state, so there is nothing to clean up.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("order has no line items")]
    EmptyOrder,

    #[error("quantity for product {product_id} must be positive (got {quantity})")]
    NonPositiveQuantity {
        product_id: ProductId,
        quantity: i64,
    },

    #[error("product {product_id} does not exist")]
    UnknownProduct { product_id: ProductId },

    #[error("product {product_id} is not active")]
    InactiveProduct { product_id: ProductId },

    #[error("order amount overflows at product {product_id}")]
    AmountOverflow { product_id: ProductId },
}

/// One requested line as it arrives from the request-handling layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// A validated, fully priced order that has not reserved any stock yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledOrder {
    store_id: StoreId,
    lines: Vec<OrderLine>,
    total_amount: u64,
}

impl AssembledOrder {
    pub fn store_id(&self) -> StoreId {
        self.store_id
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn total_amount(&self) -> u64 {
        self.total_amount
    }

    /// Turn the assembled result into a `Pending` order owned by the
    /// placement transaction. Lines and total carry over unchanged.
    pub fn into_order(
        self,
        id: OrderId,
        customer_id: CustomerId,
        ordered_at: DateTime<Utc>,
    ) -> Order {
        Order::pending(
            id,
            self.store_id,
            customer_id,
            ordered_at,
            self.lines,
            self.total_amount,
        )
    }
}

/// Validates and prices a requested line-item list against the catalog.
///
/// Side-effect free: reads the catalog, touches nothing else.
pub struct OrderAssembler {
    catalog: Arc<dyn CatalogLookup>,
}

impl OrderAssembler {
    pub fn new(catalog: Arc<dyn CatalogLookup>) -> Self {
        Self { catalog }
    }

    /// Price and validate `items`, snapshotting current unit prices.
    ///
    /// Lines keep their requested order; `line_no` is 1-based. All amounts
    /// use checked arithmetic so a hostile request cannot wrap a total.
    pub async fn assemble(
        &self,
        store_id: StoreId,
        items: &[LineRequest],
    ) -> Result<AssembledOrder, ValidationError> {
        if items.is_empty() {
            return Err(ValidationError::EmptyOrder);
        }

        let mut lines = Vec::with_capacity(items.len());
        let mut total_amount: u64 = 0;

        for (idx, item) in items.iter().enumerate() {
            let product_id = item.product_id;
            if item.quantity <= 0 {
                return Err(ValidationError::NonPositiveQuantity {
                    product_id,
                    quantity: item.quantity,
                });
            }
            let quantity = item.quantity as u64;

            let snapshot = self
                .catalog
                .product(product_id)
                .await
                .ok_or(ValidationError::UnknownProduct { product_id })?;
            if !snapshot.active {
                return Err(ValidationError::InactiveProduct { product_id });
            }

            let line_total = quantity
                .checked_mul(snapshot.unit_price)
                .ok_or(ValidationError::AmountOverflow { product_id })?;
            total_amount = total_amount
                .checked_add(line_total)
                .ok_or(ValidationError::AmountOverflow { product_id })?;

            lines.push(OrderLine {
                line_no: idx as u32 + 1,
                product_id,
                quantity,
                unit_price: snapshot.unit_price,
                line_total,
            });
        }

        Ok(AssembledOrder {
            store_id,
            lines,
            total_amount,
        })
    }
}
