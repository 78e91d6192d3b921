use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use thiserror::Error;

use warefront_core::{ProductId, StoreId};

/// Upper bound on waiting for a stock slot before a reservation gives up.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(250);

/// Recoverable ledger failures.
///
/// Neither variant is fatal: `InsufficientStock` is a business outcome the
/// caller surfaces to the customer, `Contention` is a signal to retry the
/// whole placement.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error(
        "insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: u64,
        available: u64,
    },

    #[error("stock slot for product {product_id} could not be acquired in time")]
    Contention { product_id: ProductId },
}

/// One inventory record exists per (store, product) pair.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct StockKey {
    store_id: StoreId,
    product_id: ProductId,
}

/// Keyed quantity-on-hand store with atomic per-key reservation.
///
/// Each key owns its own mutex, so operations on distinct (store, product)
/// pairs proceed in parallel while operations on the same pair serialize.
/// Records are created lazily on the first stocking event (`release`) and
/// never removed; a missing record counts as zero on hand. Quantities are
/// `u64`, so stock cannot go negative by construction.
#[derive(Debug)]
pub struct InventoryLedger {
    slots: RwLock<HashMap<StockKey, Arc<Mutex<u64>>>>,
    lock_timeout: Duration,
}

impl Default for InventoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InventoryLedger {
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    /// Ledger with a custom bound on slot acquisition.
    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            lock_timeout,
        }
    }

    /// Atomically check-and-decrement stock for one (store, product) key.
    ///
    /// Fails with `InsufficientStock` when on-hand quantity is below the
    /// request, without mutating anything. Fails with `Contention` when the
    /// key's slot stays locked past the configured bound; the caller may
    /// retry. Does not create records: reserving against an unknown key is
    /// a shortage against zero stock.
    pub fn reserve(
        &self,
        store_id: StoreId,
        product_id: ProductId,
        quantity: u64,
    ) -> Result<(), LedgerError> {
        if quantity == 0 {
            return Ok(());
        }

        let key = StockKey {
            store_id,
            product_id,
        };
        let Some(slot) = self.existing_slot(key) else {
            return Err(LedgerError::InsufficientStock {
                product_id,
                requested: quantity,
                available: 0,
            });
        };

        let mut on_hand = slot
            .try_lock_for(self.lock_timeout)
            .ok_or(LedgerError::Contention { product_id })?;

        if *on_hand < quantity {
            return Err(LedgerError::InsufficientStock {
                product_id,
                requested: quantity,
                available: *on_hand,
            });
        }

        *on_hand -= quantity;
        Ok(())
    }

    /// Atomically increment stock for one (store, product) key.
    ///
    /// Used for the first stocking event, customer returns, and compensating
    /// rollback of a partially reserved order. Always succeeds; a rollback
    /// must land, so this waits for the slot instead of timing out.
    pub fn release(&self, store_id: StoreId, product_id: ProductId, quantity: u64) {
        if quantity == 0 {
            return;
        }

        let slot = self.slot(StockKey {
            store_id,
            product_id,
        });
        let mut on_hand = slot.lock();
        *on_hand = on_hand.saturating_add(quantity);
    }

    /// Read-only snapshot of on-hand quantity (zero when no record exists).
    pub fn quantity_of(&self, store_id: StoreId, product_id: ProductId) -> u64 {
        let key = StockKey {
            store_id,
            product_id,
        };
        match self.existing_slot(key) {
            Some(slot) => *slot.lock(),
            None => 0,
        }
    }

    fn existing_slot(&self, key: StockKey) -> Option<Arc<Mutex<u64>>> {
        self.slots.read().get(&key).cloned()
    }

    /// Fetch the slot for a key, creating the record lazily.
    fn slot(&self, key: StockKey) -> Arc<Mutex<u64>> {
        if let Some(slot) = self.existing_slot(key) {
            return slot;
        }
        Arc::clone(self.slots.write().entry(key).or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::thread;

    fn stocked(quantity: u64) -> (InventoryLedger, StoreId, ProductId) {
        let ledger = InventoryLedger::new();
        let store_id = StoreId::new();
        let product_id = ProductId::new();
        ledger.release(store_id, product_id, quantity);
        (ledger, store_id, product_id)
    }

    #[test]
    fn reserve_decrements_on_hand_quantity() {
        let (ledger, store_id, product_id) = stocked(10);

        ledger.reserve(store_id, product_id, 4).unwrap();
        assert_eq!(ledger.quantity_of(store_id, product_id), 6);
    }

    #[test]
    fn reserve_to_exactly_zero_succeeds() {
        let (ledger, store_id, product_id) = stocked(10);

        ledger.reserve(store_id, product_id, 10).unwrap();
        assert_eq!(ledger.quantity_of(store_id, product_id), 0);
    }

    #[test]
    fn shortage_fails_without_mutating_state() {
        let (ledger, store_id, product_id) = stocked(5);

        let err = ledger.reserve(store_id, product_id, 6).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientStock {
                product_id,
                requested: 6,
                available: 5,
            }
        );
        assert_eq!(ledger.quantity_of(store_id, product_id), 5);
    }

    #[test]
    fn unknown_key_counts_as_zero_on_hand() {
        let ledger = InventoryLedger::new();
        let store_id = StoreId::new();
        let product_id = ProductId::new();

        assert_eq!(ledger.quantity_of(store_id, product_id), 0);
        let err = ledger.reserve(store_id, product_id, 1).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientStock {
                product_id,
                requested: 1,
                available: 0,
            }
        );
        // Failed reservations must not create records.
        assert!(ledger.slots.read().is_empty());
    }

    #[test]
    fn release_creates_the_record_lazily() {
        let ledger = InventoryLedger::new();
        let store_id = StoreId::new();
        let product_id = ProductId::new();

        ledger.release(store_id, product_id, 3);
        assert_eq!(ledger.quantity_of(store_id, product_id), 3);
    }

    #[test]
    fn keys_are_independent_per_store_and_product() {
        let ledger = InventoryLedger::new();
        let store_a = StoreId::new();
        let store_b = StoreId::new();
        let product_id = ProductId::new();

        ledger.release(store_a, product_id, 5);
        ledger.release(store_b, product_id, 7);
        ledger.reserve(store_a, product_id, 5).unwrap();

        assert_eq!(ledger.quantity_of(store_a, product_id), 0);
        assert_eq!(ledger.quantity_of(store_b, product_id), 7);
    }

    #[test]
    fn concurrent_reservations_never_oversell() {
        let (ledger, store_id, product_id) = stocked(8);
        let ledger = Arc::new(ledger);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || ledger.reserve(store_id, product_id, 1).is_ok())
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&reserved| reserved)
            .count();

        // Exactly the stocked amount is sold, never more.
        assert_eq!(successes, 8);
        assert_eq!(ledger.quantity_of(store_id, product_id), 0);
    }

    #[test]
    fn held_slot_surfaces_contention_instead_of_hanging() {
        let ledger = Arc::new(InventoryLedger::with_lock_timeout(Duration::from_millis(
            10,
        )));
        let store_id = StoreId::new();
        let product_id = ProductId::new();
        ledger.release(store_id, product_id, 5);

        let slot = ledger
            .existing_slot(StockKey {
                store_id,
                product_id,
            })
            .unwrap();
        let guard = slot.lock();

        let worker = {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || ledger.reserve(store_id, product_id, 1))
        };
        let result = worker.join().unwrap();
        drop(guard);

        assert_eq!(result, Err(LedgerError::Contention { product_id }));
        assert_eq!(ledger.quantity_of(store_id, product_id), 5);
    }

    proptest! {
        /// Units are conserved: on-hand always equals stocked + released
        /// minus successfully reserved, and shortage never mutates state.
        #[test]
        fn reserve_release_conserves_units(
            initial in 0u64..1_000,
            ops in proptest::collection::vec((proptest::bool::ANY, 1u64..50), 0..64),
        ) {
            let (ledger, store_id, product_id) = stocked(initial);
            let mut expected = initial;

            for (is_reserve, quantity) in ops {
                if is_reserve {
                    match ledger.reserve(store_id, product_id, quantity) {
                        Ok(()) => expected -= quantity,
                        Err(LedgerError::InsufficientStock { available, .. }) => {
                            prop_assert_eq!(available, expected);
                            prop_assert!(expected < quantity);
                        }
                        Err(other) => prop_assert!(false, "unexpected error: {other}"),
                    }
                } else {
                    ledger.release(store_id, product_id, quantity);
                    expected += quantity;
                }
                prop_assert_eq!(ledger.quantity_of(store_id, product_id), expected);
            }
        }
    }
}
