use thiserror::Error;

use storefront_core::DomainError;

use crate::queue::QueueError;
use crate::store::RecordStoreError;

/// Error surfaced by `ShippingService` operations.
///
/// Domain errors (validation, not-found) are raised before anything is
/// written. Store and queue errors are passed through unchanged; this layer
/// never retries.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ShippingError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("record store: {0}")]
    RecordStore(RecordStoreError),

    #[error("queue: {0}")]
    Queue(#[from] QueueError),
}

impl From<RecordStoreError> for ShippingError {
    fn from(value: RecordStoreError) -> Self {
        match value {
            RecordStoreError::NotFound(id) => {
                ShippingError::Domain(DomainError::not_found(format!("shipping {id}")))
            }
            other => ShippingError::RecordStore(other),
        }
    }
}

impl ShippingError {
    pub fn is_validation(&self) -> bool {
        matches!(self, ShippingError::Domain(e) if e.is_validation())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ShippingError::Domain(e) if e.is_not_found())
    }

    pub fn is_infrastructure(&self) -> bool {
        matches!(self, ShippingError::RecordStore(_) | ShippingError::Queue(_))
    }
}
