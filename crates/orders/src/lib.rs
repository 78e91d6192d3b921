//! Order domain module.
//!
//! This crate contains the order entity and the order assembler: pure
//! pricing and validation of a requested line-item list against the catalog.
//! It never touches the inventory ledger and never persists anything.

pub mod assembler;
pub mod order;

pub use assembler::{AssembledOrder, LineRequest, OrderAssembler, ValidationError};
pub use order::{Order, OrderLine, OrderStatus};
