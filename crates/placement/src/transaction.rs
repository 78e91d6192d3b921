//! Order placement pipeline (application-level orchestration).
//!
//! A placement moves through four states:
//!
//! ```text
//! received -> assembled -> reserved -> persisted   (terminal success)
//!                 |            |            |
//!                 +------------+------------+--> failed (terminal, after rollback)
//! ```
//!
//! Forward steps are paired with known inverses: every successful stock
//! reservation is recorded in a journal, and any later failure releases the
//! journal in reverse order before the error surfaces. Callers therefore
//! never observe a partial order and never clean up inventory themselves.
//!
//! Reservation order is deterministic (ascending product id, then line
//! number) so concurrent placements over overlapping product sets acquire
//! stock slots in a globally consistent sequence.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, warn};

use warefront_catalog::CatalogLookup;
use warefront_core::{CustomerId, OrderId, ProductId, StoreId};
use warefront_ledger::{InventoryLedger, LedgerError};
use warefront_orders::{LineRequest, Order, OrderAssembler, OrderLine, ValidationError};

use crate::store::{OrderStore, PersistenceError};

/// Terminal failure of a placement.
///
/// By the time any of these surfaces, compensating rollback has already run:
/// no reservation lingers and no order record is visible.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlacementError {
    #[error("order failed validation: {0}")]
    Validation(#[from] ValidationError),

    #[error(
        "insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: u64,
        available: u64,
    },

    #[error("stock for product {product_id} is contended; retry the placement")]
    Contention { product_id: ProductId },

    #[error("order could not be persisted: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("placement cancelled before any stock was reserved")]
    Cancelled,
}

impl PlacementError {
    /// The product that made the placement fail, when one can be named.
    pub fn offending_product(&self) -> Option<ProductId> {
        match self {
            Self::Validation(err) => match err {
                ValidationError::EmptyOrder => None,
                ValidationError::NonPositiveQuantity { product_id, .. }
                | ValidationError::UnknownProduct { product_id }
                | ValidationError::InactiveProduct { product_id }
                | ValidationError::AmountOverflow { product_id } => Some(*product_id),
            },
            Self::InsufficientStock { product_id, .. } | Self::Contention { product_id } => {
                Some(*product_id)
            }
            Self::Persistence(_) | Self::Cancelled => None,
        }
    }

    /// Whether retrying the same request may succeed without changes.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Contention { .. } | Self::Persistence(PersistenceError::Retryable(_))
        )
    }
}

impl From<LedgerError> for PlacementError {
    fn from(value: LedgerError) -> Self {
        match value {
            LedgerError::InsufficientStock {
                product_id,
                requested,
                available,
            } => Self::InsufficientStock {
                product_id,
                requested,
                available,
            },
            LedgerError::Contention { product_id } => Self::Contention { product_id },
        }
    }
}

/// Cooperative cancellation handle.
///
/// Honored only while the placement is still side-effect free (before the
/// reserved state). Once reservation begins the transaction runs to
/// persisted or rolls back through the normal failure path; it is never
/// abandoned mid-flight.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A reservation that has been applied and may need compensating.
#[derive(Debug, Copy, Clone)]
struct ReservedLine {
    product_id: ProductId,
    quantity: u64,
}

/// Orchestrates one order placement as an all-or-nothing unit.
///
/// Composes the catalog seam, the inventory ledger, and the durable store
/// through traits, so the same pipeline runs against in-memory fakes in
/// tests and real backends in production.
pub struct OrderPlacement {
    assembler: OrderAssembler,
    ledger: Arc<InventoryLedger>,
    store: Arc<dyn OrderStore>,
}

impl OrderPlacement {
    pub fn new(
        catalog: Arc<dyn CatalogLookup>,
        ledger: Arc<InventoryLedger>,
        store: Arc<dyn OrderStore>,
    ) -> Self {
        Self {
            assembler: OrderAssembler::new(catalog),
            ledger,
            store,
        }
    }

    /// Place an order: validate, reserve stock, persist.
    ///
    /// Returns the confirmed order, or a [`PlacementError`] after full
    /// compensating rollback.
    pub async fn place_order(
        &self,
        store_id: StoreId,
        customer_id: CustomerId,
        items: Vec<LineRequest>,
    ) -> Result<Order, PlacementError> {
        self.place_order_cancellable(store_id, customer_id, items, &CancelFlag::new())
            .await
    }

    /// Same as [`Self::place_order`], but checks `cancel` at each point
    /// before stock is reserved. A cancellation observed in time yields
    /// [`PlacementError::Cancelled`] with no side effects; one observed too
    /// late is ignored.
    pub async fn place_order_cancellable(
        &self,
        store_id: StoreId,
        customer_id: CustomerId,
        items: Vec<LineRequest>,
        cancel: &CancelFlag,
    ) -> Result<Order, PlacementError> {
        if cancel.is_cancelled() {
            return Err(PlacementError::Cancelled);
        }
        debug!(%store_id, %customer_id, lines = items.len(), state = "received", "placement started");

        let assembled = self.assembler.assemble(store_id, &items).await?;
        debug!(
            total_amount = assembled.total_amount(),
            state = "assembled",
            "order assembled"
        );

        // Last cancellation window: nothing has been reserved yet.
        if cancel.is_cancelled() {
            return Err(PlacementError::Cancelled);
        }

        let journal = self.reserve_lines(store_id, assembled.lines())?;
        debug!(reservations = journal.len(), state = "reserved", "stock reserved");

        let mut order = assembled.into_order(OrderId::new(), customer_id, Utc::now());
        if let Err(err) = order.confirm() {
            // A freshly assembled order is pending, so a refusal here is a
            // defect in the pipeline. Treat it like a failed write: roll the
            // journal back and surface a fatal, fully compensated failure.
            self.release_journal(store_id, &journal);
            return Err(PlacementError::Persistence(PersistenceError::Fatal(
                format!("order refused confirmation: {err}"),
            )));
        }

        if let Err(err) = self.store.persist(&order).await {
            warn!(
                order_id = %order.id_typed(),
                %err,
                "persist failed after reservation; rolling back"
            );
            self.release_journal(store_id, &journal);
            return Err(PlacementError::Persistence(err));
        }

        debug!(
            order_id = %order.id_typed(),
            total_amount = order.total_amount(),
            state = "persisted",
            "order confirmed"
        );
        Ok(order)
    }

    /// Reserve stock for every line in deterministic order, journaling each
    /// success. On the first failure the journal is released (reverse order)
    /// and the offending product is named in the error.
    fn reserve_lines(
        &self,
        store_id: StoreId,
        lines: &[OrderLine],
    ) -> Result<Vec<ReservedLine>, PlacementError> {
        let mut plan: Vec<&OrderLine> = lines.iter().collect();
        plan.sort_by_key(|line| (line.product_id, line.line_no));

        let mut journal = Vec::with_capacity(plan.len());
        for line in plan {
            match self.ledger.reserve(store_id, line.product_id, line.quantity) {
                Ok(()) => journal.push(ReservedLine {
                    product_id: line.product_id,
                    quantity: line.quantity,
                }),
                Err(err) => {
                    warn!(
                        product_id = %line.product_id,
                        %err,
                        reserved_so_far = journal.len(),
                        "reservation failed; rolling back"
                    );
                    self.release_journal(store_id, &journal);
                    return Err(err.into());
                }
            }
        }
        Ok(journal)
    }

    /// Compensating rollback: undo exactly the journaled reservations, in
    /// reverse order of application.
    fn release_journal(&self, store_id: StoreId, journal: &[ReservedLine]) {
        for entry in journal.iter().rev() {
            self.ledger.release(store_id, entry.product_id, entry.quantity);
        }
    }
}
