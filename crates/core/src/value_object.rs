//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values: two
/// value objects with the same values are the same value. Price snapshots and
/// line amounts are value objects; orders and stock records are entities.
///
/// To "modify" a value object, build a new one. Immutability keeps snapshots
/// stable even when the source data (e.g. a catalog price) later changes.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
