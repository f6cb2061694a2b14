//! Record-store boundary for shipment records.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use storefront_core::{OrderId, ShippingId};

use crate::record::{ShippingRecord, WriteAck};
use crate::shipping_type::ShippingType;
use crate::status::ShippingStatus;

/// Record store operation error (infrastructure, not domain).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecordStoreError {
    #[error("shipping record not found: {0}")]
    NotFound(ShippingId),

    #[error("storage error: {0}")]
    Storage(String),

    /// A stored row could not be decoded back into a record.
    #[error("corrupt shipping record: {0}")]
    Corrupt(String),
}

/// Key-value store of shipment records, keyed by `shipping_id`.
///
/// Implementations must give read-your-writes consistency for a single key: a
/// `create_shipping` followed by `update_shipping_status` on the same id is
/// visible to the next `get_shipping`.
pub trait ShippingRecordStore: Send + Sync {
    /// Persist a new record and return its generated identifier.
    fn create_shipping(
        &self,
        shipping_type: ShippingType,
        product_ids: &[String],
        order_id: &OrderId,
        status: ShippingStatus,
        due_date: DateTime<Utc>,
    ) -> Result<ShippingId, RecordStoreError>;

    /// `Ok(None)` when no record exists for `shipping_id`.
    fn get_shipping(&self, shipping_id: &ShippingId)
    -> Result<Option<ShippingRecord>, RecordStoreError>;

    /// Overwrite the status of an existing record.
    fn update_shipping_status(
        &self,
        shipping_id: &ShippingId,
        status: ShippingStatus,
    ) -> Result<WriteAck, RecordStoreError>;
}

impl<S> ShippingRecordStore for Arc<S>
where
    S: ShippingRecordStore + ?Sized,
{
    fn create_shipping(
        &self,
        shipping_type: ShippingType,
        product_ids: &[String],
        order_id: &OrderId,
        status: ShippingStatus,
        due_date: DateTime<Utc>,
    ) -> Result<ShippingId, RecordStoreError> {
        (**self).create_shipping(shipping_type, product_ids, order_id, status, due_date)
    }

    fn get_shipping(
        &self,
        shipping_id: &ShippingId,
    ) -> Result<Option<ShippingRecord>, RecordStoreError> {
        (**self).get_shipping(shipping_id)
    }

    fn update_shipping_status(
        &self,
        shipping_id: &ShippingId,
        status: ShippingStatus,
    ) -> Result<WriteAck, RecordStoreError> {
        (**self).update_shipping_status(shipping_id, status)
    }
}
