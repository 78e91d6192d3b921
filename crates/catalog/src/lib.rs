//! Catalog/pricing lookup seam.
//!
//! The order core never owns product data; it reads price and availability
//! through the [`CatalogLookup`] trait and works on immutable
//! [`ProductSnapshot`] values from then on.

pub mod lookup;
pub mod product;

pub use lookup::{CatalogLookup, InMemoryCatalog};
pub use product::ProductSnapshot;
