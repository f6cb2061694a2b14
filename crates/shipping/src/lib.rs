//! Shipping domain module: the shipment lifecycle state machine.
//!
//! `ShippingService` validates shipment requests, persists records through a
//! [`ShippingRecordStore`], signals pending work through a [`ShippingQueue`]
//! and later resolves each shipment against its due date.
//!
//! The store and queue are narrow traits; concrete backends live elsewhere
//! (see `storefront-infra` for the in-memory ones).

pub mod error;
pub mod queue;
pub mod record;
pub mod service;
pub mod settings;
pub mod shipping_type;
pub mod status;
pub mod store;

pub use error::ShippingError;
pub use queue::{QueueError, ShippingQueue};
pub use record::{ShippingRecord, WriteAck};
pub use service::{BatchItem, Resolution, ShippingBackend, ShippingService};
pub use settings::ShippingSettings;
pub use shipping_type::ShippingType;
pub use status::ShippingStatus;
pub use store::{RecordStoreError, ShippingRecordStore};
