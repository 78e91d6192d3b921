//! `warefront-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! strongly-typed identifiers, the shared error model, and the marker traits
//! used by the order/inventory modules.

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{CustomerId, OrderId, ProductId, StoreId};
pub use value_object::ValueObject;
