//! Storefront sales: shopping carts, orders and shipment handles.
//!
//! Carts hold stock reservations on shared products; an order commits its cart
//! and hands the purchased product list to a [`ShippingBackend`] implementation.
//!
//! [`ShippingBackend`]: storefront_shipping::ShippingBackend

pub mod cart;
pub mod order;
pub mod shipment;

pub use cart::{CartLine, ShoppingCart};
pub use order::{DEFAULT_DUE_GRACE_SECS, Order, OrderError};
pub use shipment::Shipment;
