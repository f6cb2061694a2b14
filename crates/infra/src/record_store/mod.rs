//! Shipment record storage adapters.

pub mod in_memory;
pub mod item;

pub use in_memory::InMemoryShippingStore;
pub use item::ShippingItem;
