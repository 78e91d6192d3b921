use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use warefront_core::{CustomerId, DomainError, DomainResult, Entity, OrderId, ProductId, StoreId};

/// Order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Cancelled,
}

/// Order line: product reference, quantity, and the price snapshot taken at
/// assembly time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    /// 1-based position within the order.
    pub line_no: u32,
    pub product_id: ProductId,
    pub quantity: u64,
    /// Unit price snapshot in smallest currency unit (e.g., cents).
    pub unit_price: u64,
    /// quantity × unit_price, computed once at assembly.
    pub line_total: u64,
}

/// Entity: Order.
///
/// Created exclusively by the placement transaction (via
/// [`crate::AssembledOrder::into_order`]), starting out `Pending`. Lines and
/// total are fixed at assembly; once `Confirmed` the order is immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    store_id: StoreId,
    customer_id: CustomerId,
    ordered_at: DateTime<Utc>,
    status: OrderStatus,
    lines: Vec<OrderLine>,
    total_amount: u64,
}

impl Order {
    pub(crate) fn pending(
        id: OrderId,
        store_id: StoreId,
        customer_id: CustomerId,
        ordered_at: DateTime<Utc>,
        lines: Vec<OrderLine>,
        total_amount: u64,
    ) -> Self {
        Self {
            id,
            store_id,
            customer_id,
            ordered_at,
            status: OrderStatus::Pending,
            lines,
            total_amount,
        }
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn store_id(&self) -> StoreId {
        self.store_id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn ordered_at(&self) -> DateTime<Utc> {
        self.ordered_at
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn total_amount(&self) -> u64 {
        self.total_amount
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == OrderStatus::Confirmed
    }

    /// Whether the stored total still equals the sum of line totals.
    pub fn total_reconciles(&self) -> bool {
        let mut sum: u64 = 0;
        for line in &self.lines {
            match sum.checked_add(line.line_total) {
                Some(next) => sum = next,
                None => return false,
            }
        }
        sum == self.total_amount
    }

    /// Mark every reservation as satisfied: `Pending` → `Confirmed`.
    pub fn confirm(&mut self) -> DomainResult<()> {
        if self.status != OrderStatus::Pending {
            return Err(DomainError::invariant(
                "only a pending order can be confirmed",
            ));
        }
        self.status = OrderStatus::Confirmed;
        Ok(())
    }

    /// Abandon a not-yet-confirmed order: `Pending` → `Cancelled`.
    ///
    /// Confirmed orders are immutable; a return flows through the inventory
    /// ledger directly, not through this transition.
    pub fn cancel(&mut self) -> DomainResult<()> {
        if self.status != OrderStatus::Pending {
            return Err(DomainError::invariant(
                "only a pending order can be cancelled",
            ));
        }
        self.status = OrderStatus::Cancelled;
        Ok(())
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
