//! Inventory ledger: per-(store, product) quantity on hand.
//!
//! The ledger is the single owner of stock mutation. All changes go through
//! `reserve` (check-and-decrement) and `release` (increment); both are
//! linearizable per key, so concurrent orders can never sell the same unit
//! twice.

pub mod ledger;

pub use ledger::{InventoryLedger, LedgerError, DEFAULT_LOCK_TIMEOUT};
