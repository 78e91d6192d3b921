//! Order placement transaction.
//!
//! Orchestrates assembly, stock reservation, and durable persistence as one
//! all-or-nothing unit. From the caller's point of view `place_order` either
//! returns a confirmed order or fails with no visible side effects.

pub mod store;
pub mod transaction;

pub use store::{InMemoryOrderStore, OrderStore, PersistenceError};
pub use transaction::{CancelFlag, OrderPlacement, PlacementError};
