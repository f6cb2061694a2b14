//! Infrastructure layer: record store and queue adapters, config, workers.
//!
//! Only in-memory adapters ship here; durable backends implement the same
//! `storefront-shipping` traits.

pub mod config;
pub mod queue;
pub mod record_store;
pub mod workers;


pub use config::{FulfillmentConfig, InMemoryShippingService};
pub use queue::InMemoryShippingQueue;
pub use record_store::{InMemoryShippingStore, ShippingItem};
pub use workers::{ShippingWorker, ShippingWorkerConfig, WorkerHandle, WorkerStats};
