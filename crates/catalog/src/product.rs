use serde::{Deserialize, Serialize};

use warefront_core::{ProductId, ValueObject};

/// Point-in-time view of a catalog product.
///
/// A snapshot is taken when an order is assembled; later price or status
/// changes in the catalog never alter an order that already captured it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub product_id: ProductId,
    /// Price in smallest currency unit (e.g., cents).
    pub unit_price: u64,
    /// Whether the product may currently be sold.
    pub active: bool,
}

impl ProductSnapshot {
    pub fn new(product_id: ProductId, unit_price: u64, active: bool) -> Self {
        Self {
            product_id,
            unit_price,
            active,
        }
    }
}

impl ValueObject for ProductSnapshot {}
