//! Background workers.

pub mod shipping_worker;

pub use shipping_worker::{ShippingWorker, ShippingWorkerConfig, WorkerHandle, WorkerStats};
