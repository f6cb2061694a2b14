//! Products domain module.
//!
//! Inventory-backed catalog items: identity by name, a price and a stock
//! counter with cart reservations.

pub mod product;

pub use product::{Product, ProductName, SharedProduct};
